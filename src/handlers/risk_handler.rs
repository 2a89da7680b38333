//! handlers/risk_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{
    models::risk_model::{ImportRisksRequest, UpsertRiskRequest},
    services::risk_service::RiskService,
};

fn error_response(e: anyhow::Error) -> HttpResponse {
    log::error!("Error en risk_handler: {:#}", e);
    HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": format!("{e:#}")
    }))
}

/// GET /api/risks
pub async fn list_risks_endpoint(risk_service: web::Data<RiskService>) -> HttpResponse {
    match risk_service.list().await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => error_response(e),
    }
}

/// POST /api/risks
pub async fn upsert_risk_endpoint(
    risk_service: web::Data<RiskService>,
    body: web::Json<UpsertRiskRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    if req.country.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "country is required"
        }));
    }

    match risk_service.upsert(&req).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => error_response(e),
    }
}

/// POST /api/risks/import
pub async fn import_risks_endpoint(
    risk_service: web::Data<RiskService>,
    body: web::Json<ImportRisksRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    if req.rows.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "no rows to import"
        }));
    }

    match risk_service.import_rows(&req.rows, &req.updated_by).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(e),
    }
}

/// GET /api/risks/{country}
pub async fn get_risk_endpoint(
    risk_service: web::Data<RiskService>,
    path: web::Path<String>,
) -> HttpResponse {
    let country = path.into_inner();

    match risk_service.get(&country).await {
        Ok(Some(assessment)) => HttpResponse::Ok().json(assessment),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "success": false,
            "error": format!("No risk assessment for {country}")
        })),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/risks/{country}
pub async fn delete_risk_endpoint(
    risk_service: web::Data<RiskService>,
    path: web::Path<String>,
) -> HttpResponse {
    let country = path.into_inner();

    match risk_service.delete(&country).await {
        Ok(true) => HttpResponse::Ok().json(json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(json!({
            "success": false,
            "error": format!("No risk assessment for {country}")
        })),
        Err(e) => error_response(e),
    }
}
