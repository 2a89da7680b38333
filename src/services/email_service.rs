//! services/email_service.rs
//! Cliente de entrega: una llamada al proveedor de correo por grupo de
//! destinatarios. Sin reintentos; un timeout cuenta como cualquier otro fallo.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    config::app_config::{AppConfig, EmailBackend, SmtpConfig},
    models::email_model::DeliveryOutcome,
};

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Envía un mensaje a todas las direcciones del grupo.
    /// Devuelve el id asignado por el proveedor.
    async fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<String>;
}

/// Llama al cliente y convierte cualquier error en `DeliveryOutcome::Failed`.
pub async fn deliver(
    client: &dyn DeliveryClient,
    addresses: &[String],
    subject: &str,
    html: &str,
) -> DeliveryOutcome {
    match client.send(addresses, subject, html).await {
        Ok(message_id) => DeliveryOutcome::Sent { message_id },
        Err(e) => DeliveryOutcome::Failed {
            reason: format!("{e:#}"),
        },
    }
}

/// Construye el backend configurado en `EMAIL_BACKEND`.
pub fn build_delivery_client(config: &AppConfig) -> Result<Arc<dyn DeliveryClient>> {
    let client: Arc<dyn DeliveryClient> = match config.email_backend {
        EmailBackend::Http => Arc::new(HttpDeliveryClient::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
            config.delivery_timeout,
        )?),
        EmailBackend::Smtp => Arc::new(SmtpDeliveryClient::new(
            &config.smtp,
            &config.email_from,
            config.delivery_timeout,
        )?),
        EmailBackend::Noop => Arc::new(NoopDeliveryClient),
    };
    log::info!(
        "(build_delivery_client) Backend de correo: {:?}",
        config.email_backend
    );
    Ok(client)
}

// ========================================================================
// API HTTP transaccional (estilo Resend)
// ========================================================================

#[derive(Clone)]
pub struct HttpDeliveryClient {
    http_client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpDeliveryClient {
    pub fn new(api_url: String, api_key: String, from: String, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<String> {
        log::info!("(HttpDeliveryClient::send) to={:?}", addresses);

        let payload = json!({
            "from": self.from,
            "to": addresses,
            "subject": subject,
            "html": html,
        });

        let resp = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Email API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            let reason = body
                .get("message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Email API returned {status}"));
            log::error!("(HttpDeliveryClient::send) status={} error={}", status, reason);
            return Err(anyhow!(reason));
        }

        let body = resp
            .json::<Value>()
            .await
            .context("Invalid email API response")?;
        let message_id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("Email API response without id"))?;

        Ok(message_id.to_string())
    }
}

// ========================================================================
// SMTP (lettre)
// ========================================================================

#[derive(Clone)]
pub struct SmtpDeliveryClient {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

impl SmtpDeliveryClient {
    pub fn new(config: &SmtpConfig, from: &str, timeout: Duration) -> Result<Self> {
        let from: Mailbox = from.parse().context("Invalid from address")?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("Invalid SMTP host")?
            .port(config.port);
        if !config.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.user.clone(),
                config.pass.clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from,
            timeout,
        })
    }
}

#[async_trait]
impl DeliveryClient for SmtpDeliveryClient {
    async fn send(&self, addresses: &[String], subject: &str, html: &str) -> Result<String> {
        log::info!("(SmtpDeliveryClient::send) to={:?}", addresses);

        let message_id = format!("<{}@risk-notifier>", Uuid::new_v4());
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject)
            .message_id(Some(message_id.clone()));
        for addr in addresses {
            let to: Mailbox = addr
                .parse()
                .map_err(|e| anyhow!("Invalid recipient address '{}': {}", addr, e))?;
            builder = builder.to(to);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .context("Failed to build email message")?;

        tokio::time::timeout(self.timeout, self.mailer.send(message))
            .await
            .map_err(|_| anyhow!("SMTP send timed out after {:?}", self.timeout))?
            .context("SMTP send failed")?;

        Ok(message_id)
    }
}

// ========================================================================
// Noop (desarrollo local)
// ========================================================================

#[derive(Debug, Clone)]
pub struct NoopDeliveryClient;

#[async_trait]
impl DeliveryClient for NoopDeliveryClient {
    async fn send(&self, addresses: &[String], subject: &str, _html: &str) -> Result<String> {
        log::info!(
            "(NoopDeliveryClient::send) Saltando envío to={:?} subject='{}'",
            addresses,
            subject
        );
        Ok(format!("noop-{}", Uuid::new_v4()))
    }
}
