use bot_server::logging::init_logging;
use bot_server::{run_server, ServerConfig};
use clap::Parser;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    init_logging(config.log_level.as_deref(), config.debug);

    log::info!("🤖 Super-Bot is starting with webhooks...");
    if config.debug {
        log::debug!("Token service: {}", config.token_service_url);
        log::debug!("GitHub API: {}", config.github_api_url);
        log::debug!("Telegram API: {}", config.telegram_api_url);
    }

    run_server(config).await
}
