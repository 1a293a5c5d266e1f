//! Incoming webhook payloads

use bot_core::{ChatId, EventKind, InboundEvent, MessageId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// Translate the update into a core event. Updates the bot has no use
    /// for (edited messages, stickers, callbacks without a chat) yield `None`.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(InboundEvent::new(
                ChatId(message.chat.id),
                EventKind::Callback {
                    callback_id: query.id,
                    message_id: Some(MessageId(message.message_id)),
                    data: query.data.unwrap_or_default(),
                },
            ));
        }

        let message = self.message?;
        let chat = ChatId(message.chat.id);
        if let Some(document) = message.document {
            return Some(InboundEvent::new(
                chat,
                EventKind::Document {
                    file_id: document.file_id,
                    file_name: document.file_name,
                },
            ));
        }

        let text = message.text?;
        let kind = match command(&text) {
            Some("start") => EventKind::Start,
            Some("cancel") => EventKind::Cancel,
            _ => EventKind::Text(text),
        };
        Some(InboundEvent::new(chat, kind))
    }
}

/// `/start@my_bot arg` -> `start`
fn command(text: &str) -> Option<&str> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    name.split('@').next()
}
