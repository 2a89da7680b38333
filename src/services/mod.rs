//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod email_service;
pub mod notification_log_service;
pub mod notification_service;
pub mod recipient_service;
pub mod risk_service;
pub mod template_service;
