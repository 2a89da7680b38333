//! services/template_service.rs
//! Genera el HTML del correo de evaluación de riesgo con tera.
//! La plantilla va embebida en el binario (`include_str!`) y tera escapa
//! todos los valores interpolados.

use anyhow::{Context as _, Result};
use tera::{Context, Tera};

use crate::models::risk_model::{RiskLevel, UNKNOWN_RISK_COLOR};

const RISK_TEMPLATE: &str = "risk_assessment.html";

/// Color del badge para un nivel en texto. Solo acepta la forma canónica
/// en minúsculas; cualquier otro valor cae en gris.
pub fn risk_color(level: &str) -> &'static str {
    RiskLevel::ALL
        .iter()
        .find(|l| l.as_str() == level)
        .map_or(UNKNOWN_RISK_COLOR, RiskLevel::color)
}

/// Asunto por defecto cuando el request no trae uno.
pub fn default_subject(country: &str, level: RiskLevel) -> String {
    format!(
        "Travel Risk Assessment: {} ({})",
        country.trim(),
        level.as_str().to_uppercase()
    )
}

pub fn cc_subject(subject: &str) -> String {
    format!("{subject} (CC)")
}

/// Campos del correo. `cc_primary` presente => variante CC, con banner que
/// muestra el destinatario principal.
#[derive(Debug, Clone)]
pub struct RiskEmailContent<'a> {
    pub country: &'a str,
    pub risk_level: RiskLevel,
    pub information: &'a str,
    pub traveller_name: Option<&'a str>,
    pub record_locator: Option<&'a str>,
    pub cc_primary: Option<&'a str>,
}

#[derive(Clone)]
pub struct TemplateService {
    engine: Tera,
}

impl TemplateService {
    pub fn new() -> Result<Self> {
        let mut engine = Tera::default();
        engine
            .add_raw_template(
                RISK_TEMPLATE,
                include_str!("../../templates/risk_assessment.html"),
            )
            .context("Failed to register risk assessment template")?;

        Ok(Self { engine })
    }

    /// Función pura: mismos argumentos => mismo HTML, byte a byte.
    pub fn render_risk_email(&self, content: &RiskEmailContent<'_>) -> Result<String> {
        let mut context = Context::new();
        context.insert("country", content.country);
        context.insert("risk_label", &content.risk_level.as_str().to_uppercase());
        context.insert("risk_color", risk_color(content.risk_level.as_str()));
        context.insert("information", content.information);
        context.insert("traveller_name", &content.traveller_name);
        context.insert("record_locator", &content.record_locator);
        context.insert("cc_primary", &content.cc_primary);

        self.engine
            .render(RISK_TEMPLATE, &context)
            .context("Failed to render risk assessment email")
    }
}
