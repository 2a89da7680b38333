//! handlers/notification_handler.rs
//! Endpoints de dispatch, consulta del log y reenvío.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::notification_model::{
        DispatchNotificationRequest, DispatchResult, NotifyFromAssessmentRequest, ResendRequest,
    },
    services::{
        notification_log_service::SqliteNotificationLog,
        notification_service::{
            request_from_assessment, resend_request, DispatchError, NotificationService,
        },
        risk_service::RiskService,
    },
};

#[derive(Deserialize)]
pub struct ListNotificationsQuery {
    page: Option<u64>,
    page_size: Option<u64>,
    country: Option<String>,
}

/// Traduce el resultado del dispatch a la respuesta HTTP.
fn dispatch_response(result: Result<DispatchResult, DispatchError>) -> HttpResponse {
    match result {
        Ok(res) if res.success => HttpResponse::Ok().json(res),
        Ok(res) => HttpResponse::BadGateway().json(res),
        Err(e @ DispatchError::Validation(_)) => HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": e.to_string()
        })),
        Err(e @ DispatchError::LogCreate(_)) => HttpResponse::ServiceUnavailable().json(json!({
            "success": false,
            "error": e.to_string()
        })),
    }
}

fn not_found(what: String) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "error": what
    }))
}

fn internal_error(e: anyhow::Error) -> HttpResponse {
    log::error!("Error interno: {:#}", e);
    HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": format!("{e:#}")
    }))
}

/// POST /api/notifications
pub async fn dispatch_notification_endpoint(
    notification_service: web::Data<NotificationService>,
    body: web::Json<DispatchNotificationRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    dispatch_response(notification_service.dispatch_notification(&req).await)
}

/// POST /api/notifications/country/{country}
pub async fn notify_from_assessment_endpoint(
    notification_service: web::Data<NotificationService>,
    risk_service: web::Data<RiskService>,
    path: web::Path<String>,
    body: web::Json<NotifyFromAssessmentRequest>,
) -> HttpResponse {
    let country = path.into_inner();

    let assessment = match risk_service.get(&country).await {
        Ok(Some(a)) => a,
        Ok(None) => return not_found(format!("No risk assessment for {country}")),
        Err(e) => return internal_error(e),
    };

    let req = request_from_assessment(&assessment, body.into_inner());
    dispatch_response(notification_service.dispatch_notification(&req).await)
}

/// GET /api/notifications
pub async fn list_notifications_endpoint(
    log_service: web::Data<SqliteNotificationLog>,
    query: web::Query<ListNotificationsQuery>,
) -> HttpResponse {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(20);

    match log_service
        .list(page, page_size, query.country.as_deref())
        .await
    {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => internal_error(e),
    }
}

/// GET /api/notifications/{id}
pub async fn get_notification_endpoint(
    log_service: web::Data<SqliteNotificationLog>,
    path: web::Path<String>,
) -> HttpResponse {
    let log_id = path.into_inner();

    match log_service.get(&log_id).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => not_found(format!("Notification {log_id} not found")),
        Err(e) => internal_error(e),
    }
}

/// POST /api/notifications/{id}/resend
pub async fn resend_notification_endpoint(
    notification_service: web::Data<NotificationService>,
    log_service: web::Data<SqliteNotificationLog>,
    risk_service: web::Data<RiskService>,
    path: web::Path<String>,
    body: web::Json<ResendRequest>,
) -> HttpResponse {
    let log_id = path.into_inner();

    let record = match log_service.get(&log_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(format!("Notification {log_id} not found")),
        Err(e) => return internal_error(e),
    };
    let assessment = match risk_service.get(&record.country).await {
        Ok(Some(a)) => a,
        Ok(None) => return not_found(format!("No risk assessment for {}", record.country)),
        Err(e) => return internal_error(e),
    };

    log::info!(
        "(resend_notification_endpoint) Reenviando log_id={} por {}",
        log_id,
        body.sent_by
    );
    let req = resend_request(&record, &assessment, &body.sent_by);
    dispatch_response(notification_service.dispatch_notification(&req).await)
}
