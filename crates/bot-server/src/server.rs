use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use bot_clients::TelegramClient;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::health::handler))
        .route("/{bot_token}", web::post().to(handlers::webhook::handler));
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let telegram = Arc::new(
        TelegramClient::new(&config.bot_token).with_base_url(&config.telegram_api_url),
    );

    match config.webhook_url() {
        Some(url) => {
            telegram
                .register_webhook(&url)
                .await
                .context("failed to register the Telegram webhook")?;
            log::info!(
                "Webhook set to {}",
                config.external_url.as_deref().unwrap_or_default()
            );
        }
        None => log::warn!("RENDER_EXTERNAL_URL is not set; webhook left unchanged"),
    }

    let state = web::Data::new(AppState::from_config(&config, telegram));

    log::info!("Listening on 0.0.0.0:{}", config.port);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", config.port))
        .with_context(|| format!("failed to bind port {}", config.port))?
        .run()
        .await?;
    Ok(())
}
