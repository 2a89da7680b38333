//! app.rs
use crate::handlers::{notification_handler, risk_handler};
use actix_web::{error, web, HttpRequest, HttpResponse};
use serde_json::json;

/// Body o query mal formados responden 400 con el mismo JSON de error
/// que el resto de la API.
fn bad_request<E>(err: E) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let message = err.to_string();
    log::warn!("(bad_request) Request rechazado: {}", message);
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": message
        })),
    )
    .into()
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    bad_request(err)
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    bad_request(err)
}

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .service(
                web::scope("/notifications")
                    .route(
                        "",
                        web::post().to(notification_handler::dispatch_notification_endpoint),
                    )
                    .route(
                        "",
                        web::get().to(notification_handler::list_notifications_endpoint),
                    )
                    .route(
                        "/country/{country}",
                        web::post().to(notification_handler::notify_from_assessment_endpoint),
                    )
                    .route(
                        "/{id}",
                        web::get().to(notification_handler::get_notification_endpoint),
                    )
                    .route(
                        "/{id}/resend",
                        web::post().to(notification_handler::resend_notification_endpoint),
                    ),
            )
            .service(
                web::scope("/risks")
                    .route("", web::get().to(risk_handler::list_risks_endpoint))
                    .route("", web::post().to(risk_handler::upsert_risk_endpoint))
                    .route("/import", web::post().to(risk_handler::import_risks_endpoint))
                    .route("/{country}", web::get().to(risk_handler::get_risk_endpoint))
                    .route(
                        "/{country}",
                        web::delete().to(risk_handler::delete_risk_endpoint),
                    ),
            ),
    );
}
