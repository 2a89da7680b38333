//! models/notification_model.rs
//! Registro de auditoría de notificaciones y requests/responses del dispatch.

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::risk_model::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(anyhow!("Unknown delivery status '{}'", other)),
        }
    }
}

/// Una fila de `notification_logs`: un intento de dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub id: String,
    pub recipient: String,
    pub cc: Vec<String>,
    pub country: String,
    pub risk_level: RiskLevel,
    pub sent_by: String,
    pub traveller_name: Option<String>,
    pub record_locator: Option<String>,
    pub recipient_status: DeliveryStatus,
    pub recipient_error_message: Option<String>,
    /// Solo existe si `cc` no está vacío
    pub cc_status: Option<DeliveryStatus>,
    pub cc_error_message: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// Datos para crear el registro en estado "pending".
#[derive(Debug, Clone)]
pub struct NewNotificationRecord {
    pub recipient: String,
    pub cc: Vec<String>,
    pub country: String,
    pub risk_level: RiskLevel,
    pub sent_by: String,
    pub traveller_name: Option<String>,
    pub record_locator: Option<String>,
}

/// POST /api/notifications
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchNotificationRequest {
    pub recipient: String,
    #[serde(default)]
    pub cc: Vec<String>,
    pub country: String,
    pub risk_level: RiskLevel,
    pub information: String,
    pub traveller_name: Option<String>,
    pub record_locator: Option<String>,
    /// Si no viene, se arma a partir del país y el nivel
    pub subject: Option<String>,
    pub sent_by: String,
}

/// POST /api/notifications/country/{country}
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyFromAssessmentRequest {
    pub recipient: String,
    #[serde(default)]
    pub cc: Vec<String>,
    pub traveller_name: Option<String>,
    pub record_locator: Option<String>,
    pub subject: Option<String>,
    pub sent_by: String,
}

/// POST /api/notifications/{id}/resend
#[derive(Debug, Clone, Deserialize)]
pub struct ResendRequest {
    pub sent_by: String,
}

/// Resultado visible para quien llama. `success` depende solo del envío principal.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub log_id: String,
    pub error: Option<String>,
    /// Error al actualizar el log; no cambia `success`
    pub log_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListNotificationsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<NotificationRecord>,
}
