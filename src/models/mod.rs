//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod email_model;
pub mod notification_model;
pub mod risk_model;
