//! models/email_model.rs

use serde::Serialize;

use crate::models::notification_model::DeliveryStatus;

/// Resultado de una llamada al proveedor de correo (un grupo de destinatarios).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent { message_id: String },
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }

    /// Estado final que se persiste; nunca `Pending`.
    pub fn status(&self) -> DeliveryStatus {
        match self {
            DeliveryOutcome::Sent { .. } => DeliveryStatus::Sent,
            DeliveryOutcome::Failed { .. } => DeliveryStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Sent { .. } => None,
            DeliveryOutcome::Failed { reason } => Some(reason),
        }
    }
}
