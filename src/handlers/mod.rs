//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (notificaciones y evaluaciones de riesgo).

pub mod notification_handler;
pub mod risk_handler;
