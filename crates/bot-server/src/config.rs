use clap::Parser;

/// Runtime configuration, read from flags or the environment.
#[derive(Parser, Clone)]
#[command(name = "superbot")]
#[command(about = "Telegram bot: GitHub file editor, JWT generator and JSON converter")]
#[command(version)]
pub struct ServerConfig {
    /// Telegram bot token; also the secret webhook path
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Public base URL the webhook is registered under
    #[arg(long, env = "RENDER_EXTERNAL_URL")]
    pub external_url: Option<String>,

    /// Server port
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Log level (overrides debug flag)
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,

    /// Base URL of the uid/password -> JWT service
    #[arg(
        long,
        env = "TOKEN_SERVICE_URL",
        default_value = bot_clients::token_service::DEFAULT_TOKEN_SERVICE_URL
    )]
    pub token_service_url: String,

    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = bot_clients::github::DEFAULT_GITHUB_API_URL
    )]
    pub github_api_url: String,

    #[arg(
        long,
        env = "TELEGRAM_API_URL",
        default_value = bot_clients::telegram::DEFAULT_TELEGRAM_API_URL
    )]
    pub telegram_api_url: String,
}

impl ServerConfig {
    /// `<external_url>/<bot_token>`, when an external URL is configured.
    pub fn webhook_url(&self) -> Option<String> {
        let base = self.external_url.as_deref()?.trim().trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{}/{}", base, self.bot_token))
    }
}
