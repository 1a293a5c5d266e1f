//! Token generator workflow

use std::sync::Arc;

use async_trait::async_trait;

use super::StateMachine;
use crate::artifact::Artifact;
use crate::error::{TransportError, TransportResult};
use crate::ports::{ChatTransport, ProgressReporter};
use crate::session::Step;
use crate::types::{ChatId, CredentialPair, MessageId};

const CREDENTIAL_FILE_SUFFIX: &str = ".json";

pub(super) fn is_credential_file(file_name: Option<&str>) -> bool {
    file_name
        .map(|name| name.to_lowercase().ends_with(CREDENTIAL_FILE_SUFFIX))
        .unwrap_or(false)
}

/// Reads an uploaded credential file: a JSON array of account records.
fn parse_accounts(bytes: &[u8]) -> Result<Vec<CredentialPair>, String> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| format!("❌ Failed to parse JSON: `{}`", e))?;
    match value {
        serde_json::Value::Array(records) => {
            Ok(records.iter().map(CredentialPair::from_record).collect())
        }
        _ => Err("❌ Error: JSON must be a list `[...]`.".to_string()),
    }
}

/// Edits one status message in place as the pipeline progresses.
struct StatusMessage {
    transport: Arc<dyn ChatTransport>,
    chat: ChatId,
    message: Option<MessageId>,
}

impl StatusMessage {
    async fn set(&self, text: &str) -> TransportResult<()> {
        match self.message {
            Some(message) => self.transport.edit_text(self.chat, message, text).await,
            None => Err(TransportError::Api("status message was never sent".to_string())),
        }
    }

    /// Edit the status, falling back to a fresh message if that fails.
    async fn finish(&self, text: &str) {
        if self.set(text).await.is_err() {
            if let Err(e) = self.transport.send_text(self.chat, text).await {
                log::warn!("[{}] Failed to send status: {}", self.chat, e);
            }
        }
    }
}

#[async_trait]
impl ProgressReporter for StatusMessage {
    async fn report(&self, completed: usize, total: usize) -> TransportResult<()> {
        self.set(&format!("⏳ Processed {}/{} accounts...", completed, total))
            .await
    }
}

impl StateMachine {
    pub(super) async fn generate_tokens(&self, chat: ChatId, file_id: &str) -> Step {
        let status = StatusMessage {
            transport: Arc::clone(&self.transport),
            chat,
            message: self.say(chat, "✅ JSON received! Generating JWTs...").await,
        };

        let bytes = match self.transport.download_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                status
                    .finish(&format!("❌ Failed to download file: `{}`", e))
                    .await;
                return Step::AwaitingCredentialFile;
            }
        };
        let pairs = match parse_accounts(&bytes) {
            Ok(pairs) => pairs,
            Err(message) => {
                status.finish(&message).await;
                return Step::AwaitingCredentialFile;
            }
        };

        log::info!("[{}] Generating tokens for {} accounts", chat, pairs.len());
        let tokens = self.pipeline.enrich(pairs, &status).await;

        let artifact = match Artifact::write(&format!("jwts_{}.json", chat), &tokens) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::error!("[{}] Failed to write token file: {}", chat, e);
                status
                    .finish(&format!("❌ Failed to write result file: `{}`", e))
                    .await;
                return Step::Idle;
            }
        };
        status
            .finish(&format!("✅ Complete! Found {} valid JWTs.", tokens.len()))
            .await;
        if let Err(e) = self
            .transport
            .send_document(chat, &artifact.path(), "Here are your JWT tokens!")
            .await
        {
            log::warn!("[{}] Failed to send token file: {}", chat, e);
        }
        Step::Idle
    }
}
