//! models/risk_model.rs
//! Evaluaciones de riesgo por país (tabla `risk_assessments`).

use std::{fmt, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Color del badge para un nivel que no se reconoce.
pub const UNKNOWN_RISK_COLOR: &str = "#6b7280";

/// Nivel de riesgo. Enumeración cerrada; en JSON y en DB va en minúsculas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Extreme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Extreme => "extreme",
        }
    }

    /// Color del badge en el correo
    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Extreme => "#ef4444",
            RiskLevel::High => "#f97316",
            RiskLevel::Medium => "#eab308",
            RiskLevel::Low => "#22c55e",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    /// Acepta mayúsculas/minúsculas y espacios alrededor ("High ", "EXTREME").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "extreme" => Ok(RiskLevel::Extreme),
            other => Err(anyhow!("Unknown risk level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub country: String,
    pub risk_level: RiskLevel,
    pub information: String,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/risks
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertRiskRequest {
    pub country: String,
    pub risk_level: RiskLevel,
    pub information: String,
    pub updated_by: String,
}

/// Fila tal cual sale de la hoja de cálculo; el nivel llega como texto libre.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub country: String,
    pub risk_level: String,
    #[serde(default)]
    pub information: String,
}

/// POST /api/risks/import
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRisksRequest {
    pub rows: Vec<ImportRow>,
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// Número de fila (empieza en 1)
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub rejected: Vec<RejectedRow>,
}
