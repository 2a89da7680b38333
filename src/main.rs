use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::email_service::build_delivery_client;
use crate::services::notification_log_service::SqliteNotificationLog;
use crate::services::notification_service::NotificationService;
use crate::services::risk_service::RiskService;
use crate::services::template_service::TemplateService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

async fn setup_database(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    // Crear carpeta "data" para la ruta por defecto
    std::fs::create_dir_all("data").context("No se pudo crear directorio 'data'")?;

    log::info!("Conectando a SQLite en {}", database_url);

    let options = database_url
        .parse::<SqliteConnectOptions>()
        .context("DATABASE_URL inválida")?
        .create_if_missing(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite.")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Fallo en migraciones")?;

    Ok(db_pool)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logger(&config.log_level);

    let db_pool = setup_database(&config.database_url).await?;

    let risk_service = RiskService::new(db_pool.clone());
    let log_service = SqliteNotificationLog::new(db_pool.clone());
    let delivery = build_delivery_client(&config)?;
    let templates = TemplateService::new()?;

    let notification_service =
        NotificationService::new(Arc::new(log_service.clone()), delivery, templates);

    log::info!(
        "Levantando servidor en {}:{}",
        config.bind_host,
        config.bind_port
    );
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(risk_service.clone()))
            .app_data(web::Data::new(log_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .configure(app::init_app)
    })
    .bind((config.bind_host.as_str(), config.bind_port))?
    .run()
    .await?;

    Ok(())
}
