//! Traits the core drives its collaborators through.
//!
//! Concrete implementations live in `bot-clients`; tests use in-memory fakes.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{HostingResult, TokenError, TransportResult};
use crate::types::{
    ChatId, ContentEntry, CredentialPair, MessageId, RemoteFile, Repository,
};

/// One inline button of the main menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub label: String,
    pub data: String,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> TransportResult<MessageId>;

    async fn send_menu(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[MenuButton],
    ) -> TransportResult<MessageId>;

    async fn send_document(
        &self,
        chat: ChatId,
        file: &Path,
        caption: &str,
    ) -> TransportResult<()>;

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> TransportResult<()>;

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()>;

    async fn download_file(&self, file_id: &str) -> TransportResult<Vec<u8>>;
}

/// Authenticates against the source-hosting service.
#[async_trait]
pub trait HostingConnector: Send + Sync {
    async fn connect(&self, token: &str) -> HostingResult<Arc<dyn HostingClient>>;
}

/// An authenticated session with the source-hosting service.
#[async_trait]
pub trait HostingClient: Send + Sync {
    async fn list_repositories(&self) -> HostingResult<Vec<Repository>>;

    /// Lists one directory level; `path` is empty for the repository root.
    async fn list_contents(&self, repo: &Repository, path: &str)
        -> HostingResult<Vec<ContentEntry>>;

    async fn get_file(&self, repo: &Repository, path: &str) -> HostingResult<RemoteFile>;

    /// Writes `content` over `path`. Fails with
    /// [`HostingError::StaleRevision`](crate::HostingError::StaleRevision)
    /// when `revision` no longer matches the remote file.
    async fn update_file(
        &self,
        repo: &Repository,
        path: &str,
        message: &str,
        content: &[u8],
        revision: &str,
    ) -> HostingResult<()>;
}

/// Exchanges one credential pair for a token.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn fetch_token(&self, pair: &CredentialPair) -> Result<String, TokenError>;
}

/// Receives `(completed, total)` updates from the enrichment pipeline.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, completed: usize, total: usize) -> TransportResult<()>;
}
