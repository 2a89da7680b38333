//! services/risk_service.rs
//! CRUD de evaluaciones de riesgo por país y carga masiva de filas.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, Pool, Sqlite, SqliteConnection};

use crate::models::risk_model::{
    ImportReport, ImportRow, RejectedRow, RiskAssessment, RiskLevel, UpsertRiskRequest,
};

#[derive(Debug, FromRow)]
struct RiskRow {
    country: String,
    risk_level: String,
    information: String,
    updated_by: String,
    updated_at: String,
}

impl TryFrom<RiskRow> for RiskAssessment {
    type Error = anyhow::Error;

    fn try_from(row: RiskRow) -> Result<Self> {
        Ok(RiskAssessment {
            risk_level: row.risk_level.parse()?,
            updated_at: row
                .updated_at
                .parse::<DateTime<Utc>>()
                .context("Invalid updated_at column")?,
            country: row.country,
            information: row.information,
            updated_by: row.updated_by,
        })
    }
}

#[derive(Clone, Debug)]
pub struct RiskService {
    db_pool: Pool<Sqlite>,
}

impl RiskService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        RiskService { db_pool }
    }

    /// Crea o reemplaza la evaluación del país.
    pub async fn upsert(&self, req: &UpsertRiskRequest) -> Result<RiskAssessment> {
        let mut conn = self
            .db_pool
            .acquire()
            .await
            .context("Failed to acquire database connection")?;
        write_assessment(&mut *conn, req).await
    }

    pub async fn get(&self, country: &str) -> Result<Option<RiskAssessment>> {
        let row = sqlx::query_as::<_, RiskRow>(
            r#"
            SELECT country, risk_level, information, updated_by, updated_at
            FROM risk_assessments
            WHERE country = ?1
            "#,
        )
        .bind(country.trim())
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to fetch risk assessment")?;

        row.map(RiskAssessment::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<RiskAssessment>> {
        let rows = sqlx::query_as::<_, RiskRow>(
            r#"
            SELECT country, risk_level, information, updated_by, updated_at
            FROM risk_assessments
            ORDER BY country
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to list risk assessments")?;

        rows.into_iter().map(RiskAssessment::try_from).collect()
    }

    /// Devuelve `false` si el país no existía.
    pub async fn delete(&self, country: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM risk_assessments WHERE country = ?1")
            .bind(country.trim())
            .execute(&self.db_pool)
            .await
            .context("Failed to delete risk assessment")?;

        Ok(result.rows_affected() > 0)
    }

    /// Carga masiva. Cada fila se valida por separado: las válidas se guardan,
    /// las inválidas se devuelven con su número de fila y el motivo.
    /// Las escrituras van en una sola transacción.
    pub async fn import_rows(&self, rows: &[ImportRow], updated_by: &str) -> Result<ImportReport> {
        if rows.is_empty() {
            return Err(anyhow!("no rows to import"));
        }

        // Todo o nada: si falla una escritura no queda ninguna fila a medias
        let mut tx = self
            .db_pool
            .begin()
            .await
            .context("Failed to begin risk import")?;

        let mut report = ImportReport::default();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let req = match validate_row(row, updated_by) {
                Ok(req) => req,
                Err(reason) => {
                    log::warn!("(import_rows) Fila {} rechazada: {}", row_number, reason);
                    report.rejected.push(RejectedRow {
                        row: row_number,
                        reason,
                    });
                    continue;
                }
            };

            let saved = write_assessment(&mut *tx, &req)
                .await
                .with_context(|| format!("Failed to import row {row_number}"))?;
            report.imported.push(saved.country);
        }

        tx.commit().await.context("Failed to commit risk import")?;

        log::info!(
            "(import_rows) imported={} rejected={}",
            report.imported.len(),
            report.rejected.len()
        );
        Ok(report)
    }
}

async fn write_assessment(
    conn: &mut SqliteConnection,
    req: &UpsertRiskRequest,
) -> Result<RiskAssessment> {
    let country = req.country.trim();
    if country.is_empty() {
        return Err(anyhow!("country is required"));
    }
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO risk_assessments (country, risk_level, information, updated_by, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(country) DO UPDATE SET
            risk_level = excluded.risk_level,
            information = excluded.information,
            updated_by = excluded.updated_by,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(country)
    .bind(req.risk_level.as_str())
    .bind(&req.information)
    .bind(&req.updated_by)
    .bind(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    .execute(&mut *conn)
    .await
    .context("Failed to upsert risk assessment")?;

    Ok(RiskAssessment {
        country: country.to_string(),
        risk_level: req.risk_level,
        information: req.information.clone(),
        updated_by: req.updated_by.clone(),
        updated_at: now,
    })
}

/// Convierte una fila de la hoja en un upsert, o devuelve el motivo del rechazo.
pub fn validate_row(row: &ImportRow, updated_by: &str) -> Result<UpsertRiskRequest, String> {
    let country = row.country.trim();
    if country.is_empty() {
        return Err("country is empty".to_string());
    }
    let risk_level = row
        .risk_level
        .parse::<RiskLevel>()
        .map_err(|e| e.to_string())?;

    Ok(UpsertRiskRequest {
        country: country.to_string(),
        risk_level,
        information: row.information.trim().to_string(),
        updated_by: updated_by.to_string(),
    })
}
