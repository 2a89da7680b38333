//! services/notification_log_service.rs
//! Log de auditoría de notificaciones (`notification_logs`).
//! Cada dispatch inserta un registro "pending" y lo actualiza una sola vez
//! con el estado final. Los registros nunca se borran.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::models::{
    email_model::DeliveryOutcome,
    notification_model::{
        DeliveryStatus, ListNotificationsResponse, NewNotificationRecord, NotificationRecord,
    },
};

pub const MAX_PAGE_SIZE: u64 = 100;

#[async_trait]
pub trait NotificationLog: Send + Sync {
    /// Inserta el registro con recipient_status = pending (y cc_status = pending
    /// si hay CC). Devuelve el id.
    async fn create_pending(&self, record: &NewNotificationRecord) -> Result<String>;

    /// Escribe el estado final. `cc` debe ser `Some` si y solo si el registro tiene CC.
    async fn finalize(
        &self,
        log_id: &str,
        recipient: &DeliveryOutcome,
        cc: Option<&DeliveryOutcome>,
    ) -> Result<()>;
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: String,
    recipient: String,
    cc: String,
    country: String,
    risk_level: String,
    sent_by: String,
    traveller_name: Option<String>,
    record_locator: Option<String>,
    recipient_status: String,
    recipient_error_message: Option<String>,
    cc_status: Option<String>,
    cc_error_message: Option<String>,
    sent_at: String,
}

impl TryFrom<NotificationRow> for NotificationRecord {
    type Error = anyhow::Error;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(NotificationRecord {
            cc: serde_json::from_str(&row.cc).context("Invalid cc column")?,
            risk_level: row.risk_level.parse()?,
            recipient_status: row.recipient_status.parse()?,
            cc_status: row
                .cc_status
                .as_deref()
                .map(|s| s.parse::<DeliveryStatus>())
                .transpose()?,
            sent_at: row
                .sent_at
                .parse::<DateTime<Utc>>()
                .context("Invalid sent_at column")?,
            id: row.id,
            recipient: row.recipient,
            country: row.country,
            sent_by: row.sent_by,
            traveller_name: row.traveller_name,
            record_locator: row.record_locator,
            recipient_error_message: row.recipient_error_message,
            cc_error_message: row.cc_error_message,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, recipient, cc, country, risk_level, sent_by, traveller_name,
           record_locator, recipient_status, recipient_error_message,
           cc_status, cc_error_message, sent_at
    FROM notification_logs
"#;

#[derive(Clone, Debug)]
pub struct SqliteNotificationLog {
    db_pool: Pool<Sqlite>,
}

impl SqliteNotificationLog {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        SqliteNotificationLog { db_pool }
    }

    pub async fn get(&self, log_id: &str) -> Result<Option<NotificationRecord>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(log_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch notification log")?;

        row.map(NotificationRecord::try_from).transpose()
    }

    /// Lista paginada, más recientes primero. `page` empieza en 1.
    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        country: Option<&str>,
    ) -> Result<ListNotificationsResponse> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let country = country.map(str::trim).filter(|c| !c.is_empty());
        // Un `page` enorme no debe desbordar: se responde una página vacía
        let offset = (page - 1)
            .checked_mul(page_size)
            .and_then(|o| i64::try_from(o).ok());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_logs WHERE (?1 IS NULL OR country = ?1)",
        )
        .bind(country)
        .fetch_one(&self.db_pool)
        .await
        .context("Failed to count notification logs")?;

        let Some(offset) = offset else {
            log::warn!("(list) page={} fuera de rango, devolviendo página vacía", page);
            return Ok(ListNotificationsResponse {
                total: total as u64,
                page,
                page_size,
                items: Vec::new(),
            });
        };

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "{SELECT_COLUMNS} WHERE (?1 IS NULL OR country = ?1)
             ORDER BY sent_at DESC, rowid DESC
             LIMIT ?2 OFFSET ?3"
        ))
        .bind(country)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to list notification logs")?;

        let items = rows
            .into_iter()
            .map(NotificationRecord::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListNotificationsResponse {
            total: total as u64,
            page,
            page_size,
            items,
        })
    }
}

#[async_trait]
impl NotificationLog for SqliteNotificationLog {
    async fn create_pending(&self, record: &NewNotificationRecord) -> Result<String> {
        let log_id = Uuid::new_v4().to_string();
        let sent_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let cc_json = serde_json::to_string(&record.cc)?;
        let cc_status = (!record.cc.is_empty()).then_some(DeliveryStatus::Pending.as_str());

        sqlx::query(
            r#"
            INSERT INTO notification_logs (
                id, recipient, cc, country, risk_level, sent_by,
                traveller_name, record_locator,
                recipient_status, recipient_error_message,
                cc_status, cc_error_message, sent_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', NULL, ?9, NULL, ?10)
            "#,
        )
        .bind(&log_id)
        .bind(&record.recipient)
        .bind(cc_json)
        .bind(&record.country)
        .bind(record.risk_level.as_str())
        .bind(&record.sent_by)
        .bind(&record.traveller_name)
        .bind(&record.record_locator)
        .bind(cc_status)
        .bind(sent_at)
        .execute(&self.db_pool)
        .await
        .context("Failed to insert notification log")?;

        Ok(log_id)
    }

    async fn finalize(
        &self,
        log_id: &str,
        recipient: &DeliveryOutcome,
        cc: Option<&DeliveryOutcome>,
    ) -> Result<()> {
        // Solo pasa de pending a final una vez; el cc_status tiene que
        // coincidir con la presencia de CC en el registro.
        let result = sqlx::query(
            r#"
            UPDATE notification_logs
            SET recipient_status = ?2,
                recipient_error_message = ?3,
                cc_status = ?4,
                cc_error_message = ?5
            WHERE id = ?1
              AND recipient_status = 'pending'
              AND ((?4 IS NULL AND cc_status IS NULL)
                   OR (?4 IS NOT NULL AND cc_status = 'pending'))
            "#,
        )
        .bind(log_id)
        .bind(recipient.status().as_str())
        .bind(recipient.error_message())
        .bind(cc.map(|o| o.status().as_str()))
        .bind(cc.and_then(|o| o.error_message()))
        .execute(&self.db_pool)
        .await
        .context("Failed to update notification log")?;

        if result.rows_affected() != 1 {
            return Err(anyhow!(
                "Notification log {} is missing, already finalized or has mismatched cc",
                log_id
            ));
        }
        Ok(())
    }
}
