use std::sync::Arc;

use bot_clients::{GithubConnector, TokenServiceClient};
use bot_core::{
    ChatTransport, Dispatcher, EnrichmentPipeline, HostingConnector, SessionStore, StateMachine,
    TokenService,
};

use crate::config::ServerConfig;

pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Only `POST /{bot_token}` is accepted as a webhook path.
    pub bot_token: String,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, bot_token: impl Into<String>) -> Self {
        Self {
            dispatcher,
            bot_token: bot_token.into(),
        }
    }

    /// Wire the state machine to its collaborators. Must run inside the
    /// runtime that will drive the chat workers.
    pub fn with_collaborators(
        bot_token: impl Into<String>,
        transport: Arc<dyn ChatTransport>,
        hosting: Arc<dyn HostingConnector>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        let machine = StateMachine::new(
            Arc::new(SessionStore::new()),
            transport,
            hosting,
            EnrichmentPipeline::new(tokens),
        );
        Self::new(Arc::new(Dispatcher::new(Arc::new(machine))), bot_token)
    }

    pub fn from_config(config: &ServerConfig, transport: Arc<dyn ChatTransport>) -> Self {
        let hosting = GithubConnector::new().with_base_url(&config.github_api_url);
        let tokens = TokenServiceClient::new().with_base_url(&config.token_service_url);
        Self::with_collaborators(
            &config.bot_token,
            transport,
            Arc::new(hosting),
            Arc::new(tokens),
        )
    }
}
