//! Inbound events - what the chat platform can deliver to a session

use crate::types::{ChatId, MessageId};

/// The three workflows offered by the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    RemoteFileEditor,
    TokenGenerator,
    TextExtractor,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 3] = [
        MenuChoice::RemoteFileEditor,
        MenuChoice::TokenGenerator,
        MenuChoice::TextExtractor,
    ];

    /// Payload carried by the menu button.
    pub fn callback_data(&self) -> &'static str {
        match self {
            MenuChoice::RemoteFileEditor => "github_start",
            MenuChoice::TokenGenerator => "jwt_generator_start",
            MenuChoice::TextExtractor => "json_converter_start",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.callback_data() == data)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::RemoteFileEditor => "🐙 GitHub Editor",
            MenuChoice::TokenGenerator => "🔑 JWT Generator",
            MenuChoice::TextExtractor => "⚙️ JSON Converter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `/start`: show the menu.
    Start,

    /// `/cancel`: drop the session.
    Cancel,

    /// An inline button was pressed.
    Callback {
        callback_id: String,
        /// The message holding the pressed button.
        message_id: Option<MessageId>,
        data: String,
    },

    Text(String),

    /// A file was uploaded; its bytes are fetched only when a step needs them.
    Document {
        file_id: String,
        file_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat: ChatId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(chat: ChatId, kind: EventKind) -> Self {
        Self { chat, kind }
    }

    pub fn text(chat: ChatId, text: impl Into<String>) -> Self {
        Self::new(chat, EventKind::Text(text.into()))
    }

    pub fn menu(chat: ChatId, choice: MenuChoice) -> Self {
        Self::new(
            chat,
            EventKind::Callback {
                callback_id: format!("cb-{}", chat),
                message_id: None,
                data: choice.callback_data().to_string(),
            },
        )
    }

    pub fn document(chat: ChatId, file_id: impl Into<String>, file_name: &str) -> Self {
        Self::new(
            chat,
            EventKind::Document {
                file_id: file_id.into(),
                file_name: Some(file_name.to_string()),
            },
        )
    }
}
