//! Per-chat event mailboxes
//!
//! Every chat gets its own FIFO queue drained by one worker task, so events
//! of a chat are handled one at a time and in arrival order while different
//! chats proceed independently. A worker that stays idle for
//! [`DEFAULT_IDLE_TIMEOUT`] retires and its mailbox is dropped; the next event
//! for that chat starts a fresh one. Session state lives in the session store
//! and is unaffected.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::machine::{InboundEvent, StateMachine};
use crate::types::ChatId;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

type Mailbox = mpsc::UnboundedSender<InboundEvent>;

pub struct Dispatcher {
    machine: Arc<StateMachine>,
    mailboxes: Arc<DashMap<ChatId, Mailbox>>,
    runtime: Handle,
    idle_timeout: Duration,
}

impl Dispatcher {
    /// Must be called from within a tokio runtime; workers are spawned on it.
    pub fn new(machine: Arc<StateMachine>) -> Self {
        Self {
            machine,
            mailboxes: Arc::new(DashMap::new()),
            runtime: Handle::current(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn machine(&self) -> &Arc<StateMachine> {
        &self.machine
    }

    /// Number of chats that currently have a live worker.
    pub fn active_chats(&self) -> usize {
        self.mailboxes.len()
    }

    /// Queue `event` on its chat's mailbox. Never blocks.
    pub fn submit(&self, event: InboundEvent) {
        let chat = event.chat;
        // Sending under the entry lock keeps a retiring worker from dropping
        // its mailbox between our lookup and our send.
        let mut mailbox = self
            .mailboxes
            .entry(chat)
            .or_insert_with(|| self.spawn_worker(chat));

        if let Err(mpsc::error::SendError(event)) = mailbox.send(event) {
            // The worker died (a handler panicked); start a fresh one.
            log::warn!("[{}] Mailbox closed, restarting worker", chat);
            *mailbox = self.spawn_worker(chat);
            if mailbox.send(event).is_err() {
                log::error!("[{}] Dropping event, worker unavailable", chat);
            }
        }
    }

    fn spawn_worker(&self, chat: ChatId) -> Mailbox {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let own = tx.clone();
        let machine = Arc::clone(&self.machine);
        let mailboxes = Arc::clone(&self.mailboxes);
        let idle_timeout = self.idle_timeout;
        log::debug!("[{}] Starting mailbox worker", chat);

        self.runtime.spawn(async move {
            loop {
                let event = match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(event)) => event,
                    Ok(None) => break,
                    Err(_) => match retire(&mailboxes, chat, &own, &mut rx) {
                        Some(event) => event,
                        None => break,
                    },
                };
                machine.handle(event).await;
            }
            log::debug!("[{}] Mailbox worker stopped", chat);
        });
        tx
    }
}

/// Remove the idle worker's mailbox unless an event slipped in meanwhile, in
/// which case that event is returned and the worker keeps running.
fn retire(
    mailboxes: &DashMap<ChatId, Mailbox>,
    chat: ChatId,
    own: &Mailbox,
    rx: &mut mpsc::UnboundedReceiver<InboundEvent>,
) -> Option<InboundEvent> {
    match mailboxes.entry(chat) {
        Entry::Occupied(entry) if entry.get().same_channel(own) => {
            if let Ok(event) = rx.try_recv() {
                return Some(event);
            }
            entry.remove();
            rx.close();
            None
        }
        // Already replaced; nobody sends to this channel any more.
        _ => rx.try_recv().ok(),
    }
}
