//! In-memory session store keyed by chat identity

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use super::state::Session;
use crate::types::ChatId;

/// Shared handle to one chat's session. Holding its lock makes the holder
/// the only writer for that chat.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Session store - one record per chat, lives for the process lifetime
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<ChatId, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `chat`, creating an idle one on first access.
    pub fn get_or_create(&self, chat: ChatId) -> SessionHandle {
        self.sessions
            .entry(chat)
            .or_insert_with(|| {
                log::debug!("[{}] Creating session", chat);
                Arc::new(Mutex::new(Session::default()))
            })
            .clone()
    }

    /// Reset the session for `chat` to idle. No-op when absent.
    ///
    /// The entry is reset in place rather than removed, so a handler that
    /// already holds the handle keeps talking to the live record.
    pub async fn clear(&self, chat: ChatId) {
        let handle = self.sessions.get(&chat).map(|entry| entry.clone());
        if let Some(handle) = handle {
            handle.lock().await.clear();
        }
    }

    pub fn contains(&self, chat: ChatId) -> bool {
        self.sessions.contains_key(&chat)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
