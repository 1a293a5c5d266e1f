//! Text extractor workflow

use super::StateMachine;
use crate::artifact::Artifact;
use crate::extraction::extract;
use crate::session::Step;
use crate::types::ChatId;

impl StateMachine {
    pub(super) async fn extract_from_text(&self, chat: ChatId, text: &str) -> Step {
        self.extract_and_reply(
            chat,
            text,
            "⚠️ Could not find any `uid`/`password` pairs in the text.",
            "",
        )
        .await
    }

    pub(super) async fn extract_from_file(&self, chat: ChatId, file_id: &str) -> Step {
        let bytes = match self.transport.download_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.say(chat, &format!("❌ Could not download the file: `{}`", e))
                    .await;
                return Step::AwaitingFreeTextOrFile;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        self.extract_and_reply(
            chat,
            &text,
            "⚠️ No `uid`/`password` pairs found in the file.",
            " from file",
        )
        .await
    }

    /// Empty results keep the step so the user can try again.
    async fn extract_and_reply(
        &self,
        chat: ChatId,
        text: &str,
        nothing_found: &str,
        source: &str,
    ) -> Step {
        let pairs = extract(text);
        if pairs.is_empty() {
            self.say(chat, nothing_found).await;
            return Step::AwaitingFreeTextOrFile;
        }

        let artifact = match Artifact::write(&format!("converted_{}.json", chat), &pairs) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::error!("[{}] Failed to write extraction file: {}", chat, e);
                self.say(chat, &format!("❌ Failed to write result file: `{}`", e))
                    .await;
                return Step::AwaitingFreeTextOrFile;
            }
        };
        let caption = format!("✅ Extracted {} accounts{}.", pairs.len(), source);
        if let Err(e) = self
            .transport
            .send_document(chat, &artifact.path(), &caption)
            .await
        {
            log::warn!("[{}] Failed to send extraction file: {}", chat, e);
        }
        log::info!("[{}] Extracted {} pairs", chat, pairs.len());
        Step::Idle
    }
}
