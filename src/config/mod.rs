//! config/mod.rs
//! Configuración explícita del servicio (se carga una vez en `main`).

pub mod app_config;
