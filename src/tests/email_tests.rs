//! tests/email_tests.rs
//! Clientes de entrega contra un proveedor local levantado en un puerto efímero.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{dev::ServerHandle, web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::{json, Value};

    use crate::config::app_config::{AppConfig, EmailBackend, SmtpConfig};
    use crate::models::email_model::DeliveryOutcome;
    use crate::services::email_service::{
        build_delivery_client, deliver, HttpDeliveryClient, SmtpDeliveryClient,
    };

    const API_KEY: &str = "key-1";

    async fn accepted(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
        let auth = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());
        if auth != Some("Bearer key-1") {
            return HttpResponse::Unauthorized().json(json!({ "message": "bad api key" }));
        }
        let recipients = body["to"].as_array().map_or(0, |to| to.len());
        HttpResponse::Ok().json(json!({ "id": format!("msg-{recipients}") }))
    }

    async fn rejected() -> HttpResponse {
        HttpResponse::UnprocessableEntity().json(json!({ "message": "invalid address" }))
    }

    async fn broken() -> HttpResponse {
        HttpResponse::InternalServerError().body("upstream exploded")
    }

    async fn without_id() -> HttpResponse {
        HttpResponse::Ok().json(json!({ "queued": true }))
    }

    async fn slow() -> HttpResponse {
        actix_rt::time::sleep(Duration::from_secs(3)).await;
        HttpResponse::Ok().json(json!({ "id": "too-late" }))
    }

    /// Proveedor falso en 127.0.0.1:<puerto libre>. Devuelve la URL base.
    fn start_provider() -> (String, ServerHandle) {
        let server = HttpServer::new(|| {
            App::new()
                .route("/accepted", web::post().to(accepted))
                .route("/rejected", web::post().to(rejected))
                .route("/broken", web::post().to(broken))
                .route("/without-id", web::post().to(without_id))
                .route("/slow", web::post().to(slow))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind ephemeral port");
        let addr = server.addrs()[0];

        let server = server.run();
        let handle = server.handle();
        actix_rt::spawn(server);
        (format!("http://{addr}"), handle)
    }

    fn http_client(base: &str, path: &str, timeout: Duration) -> HttpDeliveryClient {
        HttpDeliveryClient::new(
            format!("{base}{path}"),
            API_KEY.to_string(),
            "Risk <risk@x.com>".to_string(),
            timeout,
        )
        .unwrap()
    }

    fn addresses(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn failure_reason(outcome: DeliveryOutcome) -> String {
        match outcome {
            DeliveryOutcome::Failed { reason } => reason,
            other => panic!("expected a failed delivery, got {other:?}"),
        }
    }

    #[actix_rt::test]
    async fn http_success_returns_provider_id() {
        let (base, handle) = start_provider();
        let client = http_client(&base, "/accepted", Duration::from_secs(5));

        let outcome = deliver(&client, &addresses(&["a@x.com", "b@x.com"]), "Hi", "<p/>").await;
        assert_eq!(
            outcome,
            DeliveryOutcome::Sent {
                message_id: "msg-2".to_string()
            }
        );

        handle.stop(false).await;
    }

    #[actix_rt::test]
    async fn http_wrong_key_is_a_failure() {
        let (base, handle) = start_provider();
        let client = HttpDeliveryClient::new(
            format!("{base}/accepted"),
            "other-key".to_string(),
            "Risk <risk@x.com>".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        assert_eq!(failure_reason(outcome), "bad api key");

        handle.stop(false).await;
    }

    #[actix_rt::test]
    async fn http_error_body_message_becomes_the_reason() {
        let (base, handle) = start_provider();
        let client = http_client(&base, "/rejected", Duration::from_secs(5));

        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        assert_eq!(failure_reason(outcome), "invalid address");

        handle.stop(false).await;
    }

    #[actix_rt::test]
    async fn http_error_without_message_reports_status() {
        let (base, handle) = start_provider();
        let client = http_client(&base, "/broken", Duration::from_secs(5));

        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        let reason = failure_reason(outcome);
        assert!(reason.contains("Email API returned 500"), "{reason}");

        handle.stop(false).await;
    }

    #[actix_rt::test]
    async fn http_success_without_id_is_a_failure() {
        let (base, handle) = start_provider();
        let client = http_client(&base, "/without-id", Duration::from_secs(5));

        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        let reason = failure_reason(outcome);
        assert!(reason.contains("without id"), "{reason}");

        handle.stop(false).await;
    }

    #[actix_rt::test]
    async fn http_timeout_is_a_failure() {
        let (base, handle) = start_provider();
        let client = http_client(&base, "/slow", Duration::from_secs(1));

        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        let reason = failure_reason(outcome);
        assert!(reason.contains("Email API request failed"), "{reason}");

        handle.stop(false).await;
    }

    #[actix_rt::test]
    async fn http_unreachable_provider_is_a_failure() {
        let (base, handle) = start_provider();
        handle.stop(false).await;

        let client = http_client(&base, "/accepted", Duration::from_secs(2));
        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        assert!(!outcome.is_sent());
    }

    #[actix_rt::test]
    async fn smtp_server_that_never_greets_times_out() {
        // Acepta conexiones pero nunca responde al cliente SMTP
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        actix_rt::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let smtp = SmtpConfig {
            host: "127.0.0.1".to_string(),
            port,
            user: String::new(),
            pass: String::new(),
        };
        let client = SmtpDeliveryClient::new(&smtp, "risk@x.com", Duration::from_secs(1)).unwrap();

        let outcome = deliver(&client, &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        let reason = failure_reason(outcome);
        assert!(reason.contains("timed out"), "{reason}");
    }

    #[actix_rt::test]
    async fn smtp_rejects_malformed_recipient_before_connecting() {
        let smtp = SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: String::new(),
            pass: String::new(),
        };
        let client = SmtpDeliveryClient::new(&smtp, "risk@x.com", Duration::from_secs(1)).unwrap();

        let outcome = deliver(&client, &addresses(&["not an address"]), "Hi", "<p/>").await;
        assert!(failure_reason(outcome).contains("Invalid recipient address"));
    }

    #[actix_rt::test]
    async fn noop_backend_is_selected_from_config() {
        let config = AppConfig::from_lookup(|key| match key {
            "EMAIL_BACKEND" => Some("noop".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.email_backend, EmailBackend::Noop);

        let client = build_delivery_client(&config).unwrap();
        let outcome = deliver(client.as_ref(), &addresses(&["a@x.com"]), "Hi", "<p/>").await;
        match outcome {
            DeliveryOutcome::Sent { message_id } => assert!(message_id.starts_with("noop-")),
            other => panic!("expected noop delivery to succeed, got {other:?}"),
        }
    }
}
