//! config/app_config.rs
//! Configuración leída del entorno (.env incluido) y pasada a cada servicio
//! al construirlo. Ningún servicio lee variables de entorno por su cuenta.

use std::{env, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};
use dotenv::dotenv;

/// Backend de entrega de correos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    Http,
    Smtp,
    Noop,
}

impl FromStr for EmailBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(EmailBackend::Http),
            "smtp" => Ok(EmailBackend::Smtp),
            "noop" => Ok(EmailBackend::Noop),
            other => Err(anyhow!("Unknown EMAIL_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_host: String,
    pub bind_port: u16,
    pub log_level: String,
    pub email_backend: EmailBackend,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub smtp: SmtpConfig,
    pub delivery_timeout: Duration,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una fuente clave -> valor.
    /// Variables ausentes o numéricas sin parsear usan el default; un
    /// `EMAIL_BACKEND` desconocido es un error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let database_url = var_or("DATABASE_URL", "sqlite:data/risk_notifier.db");
        let bind_host = var_or("BIND_HOST", "0.0.0.0");
        let bind_port = parse_or(&lookup, "BIND_PORT", 5022);
        let log_level = var_or("RUST_LOG", "info");

        let email_backend = var_or("EMAIL_BACKEND", "http").parse()?;
        let email_api_url = var_or("EMAIL_API_URL", "https://api.resend.com/emails");
        let email_api_key = var_or("EMAIL_API_KEY", "");
        let email_from = var_or("EMAIL_FROM", "Risk Notifications <notifications@localhost>");

        let smtp = SmtpConfig {
            host: var_or("SMTP_HOST", "localhost"),
            port: parse_or(&lookup, "SMTP_PORT", 587),
            user: var_or("SMTP_USER", ""),
            pass: var_or("SMTP_PASS", ""),
        };

        let delivery_timeout =
            Duration::from_secs(parse_or(&lookup, "DELIVERY_TIMEOUT_SECS", 30));

        Ok(Self {
            database_url,
            bind_host,
            bind_port,
            log_level,
            email_backend,
            email_api_url,
            email_api_key,
            email_from,
            smtp,
            delivery_timeout,
        })
    }
}

/// Lee una variable numérica; si falta o no se puede parsear, usa el default.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
