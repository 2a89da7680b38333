//! tests/support.rs
//! Fakes y helpers compartidos por las pruebas.

use std::{collections::VecDeque, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::{
    models::{
        email_model::DeliveryOutcome,
        notification_model::{DispatchNotificationRequest, NewNotificationRecord},
        risk_model::RiskLevel,
    },
    services::{email_service::DeliveryClient, notification_log_service::NotificationLog},
};

/// Pool SQLite en memoria con las migraciones reales.
/// Una sola conexión: cada conexión en memoria es una base distinta.
pub async fn memory_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub fn request(
    recipient: &str,
    cc: &[&str],
    country: &str,
    risk: RiskLevel,
) -> DispatchNotificationRequest {
    DispatchNotificationRequest {
        recipient: recipient.to_string(),
        cc: cc.iter().map(|s| s.to_string()).collect(),
        country: country.to_string(),
        risk_level: risk,
        information: "Avoid non-essential travel.".to_string(),
        traveller_name: Some("Jane Doe".to_string()),
        record_locator: Some("ABC123".to_string()),
        subject: None,
        sent_by: "admin-1".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub addresses: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Proveedor de correo falso. Cada llamada consume la siguiente respuesta
/// programada; sin respuestas programadas, responde éxito.
#[derive(Default)]
pub struct FakeDelivery {
    responses: Mutex<VecDeque<Result<String, String>>>,
    sent: Mutex<Vec<SentEmail>>,
}

impl FakeDelivery {
    pub fn with_responses(responses: Vec<Result<&str, &str>>) -> Self {
        let queue = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            responses: Mutex::new(queue),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryClient for FakeDelivery {
    async fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<String> {
        let call_no = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(SentEmail {
                addresses: addresses.to_vec(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
            sent.len()
        };

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(id)) => Ok(id),
            Some(Err(reason)) => Err(anyhow!(reason)),
            None => Ok(format!("msg-{call_no}")),
        }
    }
}

/// Log falso con fallos configurables en la creación y en la actualización.
#[derive(Default)]
pub struct FakeLog {
    pub fail_create: bool,
    pub fail_finalize: bool,
    pub created: Mutex<Vec<NewNotificationRecord>>,
    pub finalized: Mutex<Vec<(String, DeliveryOutcome, Option<DeliveryOutcome>)>>,
}

#[async_trait]
impl NotificationLog for FakeLog {
    async fn create_pending(&self, record: &NewNotificationRecord) -> Result<String> {
        if self.fail_create {
            return Err(anyhow!("store unavailable"));
        }
        let mut created = self.created.lock().unwrap();
        created.push(record.clone());
        Ok(format!("log-{}", created.len()))
    }

    async fn finalize(
        &self,
        log_id: &str,
        recipient: &DeliveryOutcome,
        cc: Option<&DeliveryOutcome>,
    ) -> Result<()> {
        if self.fail_finalize {
            return Err(anyhow!("store unavailable"));
        }
        self.finalized
            .lock()
            .unwrap()
            .push((log_id.to_string(), recipient.clone(), cc.cloned()));
        Ok(())
    }
}
