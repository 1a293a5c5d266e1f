//! Workflow state machine
//!
//! Routes each inbound event against the chat's current [`Step`] and
//! computes the next one. The session lock is held for the whole handling of
//! an event, so one chat is never handled twice at the same time.

mod editor;
mod events;
mod extractor;
mod tokens;

use std::sync::Arc;

pub use events::{EventKind, InboundEvent, MenuChoice};

use crate::enrichment::EnrichmentPipeline;
use crate::ports::{ChatTransport, HostingConnector, MenuButton};
use crate::session::{Session, SessionStore, Step};
use crate::types::{ChatId, MessageId};

const WELCOME: &str =
    "👋 *Welcome to your 3-in-1 Super-Bot!*\n\nPlease choose a task from the menu:";
const CANCELLED: &str = "✅ Operation cancelled. Press /start to see the menu.";
const USE_MENU: &str = "⚠️ Not sure what to do. Use /start to select a task first.";

pub struct StateMachine {
    sessions: Arc<SessionStore>,
    transport: Arc<dyn ChatTransport>,
    hosting: Arc<dyn HostingConnector>,
    pipeline: EnrichmentPipeline,
}

impl StateMachine {
    pub fn new(
        sessions: Arc<SessionStore>,
        transport: Arc<dyn ChatTransport>,
        hosting: Arc<dyn HostingConnector>,
        pipeline: EnrichmentPipeline,
    ) -> Self {
        Self {
            sessions,
            transport,
            hosting,
            pipeline,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one event for its chat.
    pub async fn handle(&self, event: InboundEvent) {
        let chat = event.chat;
        let handle = self.sessions.get_or_create(chat);
        let mut session = handle.lock().await;

        let step = std::mem::take(&mut session.step);
        let from = step.name();
        let next = self.transition(chat, &mut session, step, event.kind).await;
        if from != next.name() {
            log::info!("[{}] {} -> {}", chat, from, next.name());
        }
        session.step = next;
    }

    async fn transition(
        &self,
        chat: ChatId,
        session: &mut Session,
        step: Step,
        event: EventKind,
    ) -> Step {
        match (step, event) {
            (_, EventKind::Cancel) => {
                session.clear();
                self.say(chat, CANCELLED).await;
                Step::Idle
            }

            (step, EventKind::Start) => {
                self.send_menu(chat).await;
                step
            }

            (
                step,
                EventKind::Callback {
                    callback_id,
                    message_id,
                    data,
                },
            ) => {
                if let Err(e) = self.transport.answer_callback(&callback_id).await {
                    log::debug!("[{}] Failed to answer callback: {}", chat, e);
                }
                match MenuChoice::from_callback_data(&data) {
                    Some(choice) => {
                        self.mark_selected(chat, message_id, choice).await;
                        self.enter(chat, session, choice).await
                    }
                    None => {
                        log::warn!("[{}] Unknown callback data: {}", chat, data);
                        step
                    }
                }
            }

            // ========== Remote File Editor ==========
            (Step::AwaitingHostingToken, EventKind::Text(text)) => {
                self.receive_hosting_token(chat, session, text.trim()).await
            }
            (Step::SelectingRepository { repositories }, EventKind::Text(text)) => {
                self.select_repository(chat, session, repositories, text.trim())
                    .await
            }
            (Step::SelectingFile { repository, files }, EventKind::Text(text)) => {
                self.select_file(chat, session, repository, files, text.trim())
                    .await
            }
            (Step::EditingFile { repository, file }, EventKind::Text(text)) => {
                self.write_file(
                    chat,
                    session,
                    repository,
                    file,
                    text.into_bytes(),
                    editor::TEXT_COMMIT_MESSAGE,
                )
                .await
            }
            (Step::EditingFile { repository, file }, EventKind::Document { file_id, .. }) => {
                self.write_uploaded_file(chat, session, repository, file, &file_id)
                    .await
            }

            // ========== Token Generator ==========
            (Step::AwaitingCredentialFile, EventKind::Document { file_id, file_name })
                if tokens::is_credential_file(file_name.as_deref()) =>
            {
                self.generate_tokens(chat, &file_id).await
            }

            // ========== Text Extractor ==========
            (Step::AwaitingFreeTextOrFile, EventKind::Text(text)) => {
                self.extract_from_text(chat, &text).await
            }
            (Step::AwaitingFreeTextOrFile, EventKind::Document { file_id, .. }) => {
                self.extract_from_file(chat, &file_id).await
            }

            (step, _) => {
                self.say(chat, USE_MENU).await;
                step
            }
        }
    }

    /// Start `choice`, replacing whatever workflow was active.
    async fn enter(&self, chat: ChatId, session: &mut Session, choice: MenuChoice) -> Step {
        match choice {
            MenuChoice::RemoteFileEditor => match session.hosting.clone() {
                Some(client) => self.list_repositories(chat, client.as_ref()).await,
                None => {
                    self.say(
                        chat,
                        "Please send your *GitHub Personal Access Token* to continue.",
                    )
                    .await;
                    Step::AwaitingHostingToken
                }
            },
            MenuChoice::TokenGenerator => {
                self.say(
                    chat,
                    "Please upload the JSON file with accounts (`uid` and `password`).",
                )
                .await;
                Step::AwaitingCredentialFile
            }
            MenuChoice::TextExtractor => {
                self.say(
                    chat,
                    "Please send me *any text or file* containing account details. \
                     I will extract the `uid` and `password` pairs into a clean JSON file.",
                )
                .await;
                Step::AwaitingFreeTextOrFile
            }
        }
    }

    async fn send_menu(&self, chat: ChatId) {
        let buttons: Vec<MenuButton> = MenuChoice::ALL
            .iter()
            .map(|choice| MenuButton {
                label: choice.label().to_string(),
                data: choice.callback_data().to_string(),
            })
            .collect();
        if let Err(e) = self.transport.send_menu(chat, WELCOME, &buttons).await {
            log::warn!("[{}] Failed to send menu: {}", chat, e);
        }
    }

    async fn mark_selected(&self, chat: ChatId, message: Option<MessageId>, choice: MenuChoice) {
        let Some(message) = message else {
            return;
        };
        let text = format!("Selected: *{}*", choice.label());
        if let Err(e) = self.transport.edit_text(chat, message, &text).await {
            log::debug!("[{}] Failed to mark menu selection: {}", chat, e);
        }
    }

    /// Send `text`, returning its id. Delivery failures are logged, not raised.
    async fn say(&self, chat: ChatId, text: &str) -> Option<MessageId> {
        match self.transport.send_text(chat, text).await {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("[{}] Failed to send message: {}", chat, e);
                None
            }
        }
    }
}
