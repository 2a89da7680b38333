//! services/notification_service.rs
//! Dispatch de notificaciones de riesgo:
//! log pending -> envío principal -> envío CC (si hay) -> log final.
//! El resultado para quien llama depende solo del envío principal.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    models::{
        email_model::DeliveryOutcome,
        notification_model::{
            DispatchNotificationRequest, DispatchResult, NewNotificationRecord,
            NotificationRecord, NotifyFromAssessmentRequest,
        },
        risk_model::RiskAssessment,
    },
    services::{
        email_service::{deliver, DeliveryClient},
        notification_log_service::NotificationLog,
        recipient_service::{split_recipients, RecipientGroups},
        template_service::{cc_subject, default_subject, RiskEmailContent, TemplateService},
    },
};

/// Errores que abortan el dispatch antes de enviar nada.
/// Los fallos de entrega y de actualización del log van dentro de `DispatchResult`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("failed to create notification log: {0}")]
    LogCreate(String),
}

#[derive(Clone)]
pub struct NotificationService {
    log: Arc<dyn NotificationLog>,
    delivery: Arc<dyn DeliveryClient>,
    templates: TemplateService,
}

impl NotificationService {
    pub fn new(
        log: Arc<dyn NotificationLog>,
        delivery: Arc<dyn DeliveryClient>,
        templates: TemplateService,
    ) -> Self {
        Self {
            log,
            delivery,
            templates,
        }
    }

    pub async fn dispatch_notification(
        &self,
        req: &DispatchNotificationRequest,
    ) -> Result<DispatchResult, DispatchError> {
        // 1) Validación: sin log ni llamadas de red si falla
        let (groups, subject) = validate(req)?;

        // 2) Registro pending; si falla no se envía nada
        let new_record = NewNotificationRecord {
            recipient: groups.primary.clone(),
            cc: groups.cc.clone(),
            country: req.country.trim().to_string(),
            risk_level: req.risk_level,
            sent_by: req.sent_by.clone(),
            traveller_name: req.traveller_name.clone(),
            record_locator: req.record_locator.clone(),
        };
        let log_id = self.log.create_pending(&new_record).await.map_err(|e| {
            log::error!("(dispatch_notification) No se pudo crear el log: {:#}", e);
            DispatchError::LogCreate(format!("{e:#}"))
        })?;
        log::info!(
            "(dispatch_notification) log_id={} pending country={} risk={} to={} cc={:?}",
            log_id,
            new_record.country,
            new_record.risk_level,
            groups.primary,
            groups.cc
        );

        // 3) Envío principal
        let primary_outcome = self
            .send_group(req, &[groups.primary.clone()], &subject, None)
            .await;
        log_outcome(&log_id, "primary", &primary_outcome);

        // 4) Envío CC: se intenta aunque el principal haya fallado
        let cc_outcome = if groups.has_cc() {
            let outcome = self
                .send_group(
                    req,
                    &groups.cc,
                    &cc_subject(&subject),
                    Some(groups.primary.as_str()),
                )
                .await;
            log_outcome(&log_id, "cc", &outcome);
            Some(outcome)
        } else {
            None
        };

        // 5) Log final, pase lo que pase con los envíos
        let log_error = match self
            .log
            .finalize(&log_id, &primary_outcome, cc_outcome.as_ref())
            .await
        {
            Ok(()) => None,
            Err(e) => {
                log::error!(
                    "(dispatch_notification) log_id={} no se pudo actualizar: {:#}",
                    log_id,
                    e
                );
                Some(format!("{e:#}"))
            }
        };

        // 6) Resultado
        Ok(DispatchResult {
            success: primary_outcome.is_sent(),
            error: primary_outcome.error_message().map(str::to_string),
            log_id,
            log_error,
        })
    }

    /// Renderiza y envía a un grupo. Cualquier error (plantilla o proveedor)
    /// termina como `Failed` para que el log final se escriba igual.
    async fn send_group(
        &self,
        req: &DispatchNotificationRequest,
        addresses: &[String],
        subject: &str,
        cc_primary: Option<&str>,
    ) -> DeliveryOutcome {
        let content = RiskEmailContent {
            country: req.country.trim(),
            risk_level: req.risk_level,
            information: &req.information,
            traveller_name: req.traveller_name.as_deref(),
            record_locator: req.record_locator.as_deref(),
            cc_primary,
        };

        let html = match self.templates.render_risk_email(&content) {
            Ok(html) => html,
            Err(e) => {
                return DeliveryOutcome::Failed {
                    reason: format!("{e:#}"),
                }
            }
        };

        deliver(self.delivery.as_ref(), addresses, subject, &html).await
    }
}

fn validate(
    req: &DispatchNotificationRequest,
) -> Result<(RecipientGroups, String), DispatchError> {
    if req.recipient.trim().is_empty() {
        return Err(DispatchError::Validation("recipient is required".to_string()));
    }
    if req.country.trim().is_empty() {
        return Err(DispatchError::Validation("country is required".to_string()));
    }

    let subject = match &req.subject {
        Some(s) => s.trim().to_string(),
        None => default_subject(&req.country, req.risk_level),
    };
    if subject.is_empty() {
        return Err(DispatchError::Validation("subject is required".to_string()));
    }

    let groups = split_recipients(std::iter::once(&req.recipient).chain(req.cc.iter()))
        .ok_or_else(|| DispatchError::Validation("recipient is required".to_string()))?;

    Ok((groups, subject))
}

fn log_outcome(log_id: &str, group: &str, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Sent { message_id } => log::info!(
            "(dispatch_notification) log_id={} {} sent message_id={}",
            log_id,
            group,
            message_id
        ),
        DeliveryOutcome::Failed { reason } => log::error!(
            "(dispatch_notification) log_id={} {} failed: {}",
            log_id,
            group,
            reason
        ),
    }
}

/// Dispatch con nivel e información tomados de la evaluación guardada del país.
pub fn request_from_assessment(
    assessment: &RiskAssessment,
    req: NotifyFromAssessmentRequest,
) -> DispatchNotificationRequest {
    DispatchNotificationRequest {
        recipient: req.recipient,
        cc: req.cc,
        country: assessment.country.clone(),
        risk_level: assessment.risk_level,
        information: assessment.information.clone(),
        traveller_name: req.traveller_name,
        record_locator: req.record_locator,
        subject: req.subject,
        sent_by: req.sent_by,
    }
}

/// Reenvío de un registro existente a los mismos destinatarios, con la
/// evaluación actual del país. Genera un registro nuevo.
pub fn resend_request(
    record: &NotificationRecord,
    assessment: &RiskAssessment,
    sent_by: &str,
) -> DispatchNotificationRequest {
    DispatchNotificationRequest {
        recipient: record.recipient.clone(),
        cc: record.cc.clone(),
        country: record.country.clone(),
        risk_level: assessment.risk_level,
        information: assessment.information.clone(),
        traveller_name: record.traveller_name.clone(),
        record_locator: record.record_locator.clone(),
        subject: None,
        sent_by: sent_by.to_string(),
    }
}
