//! In-memory collaborators for driving the state machine in tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bot_core::error::{HostingResult, TransportResult};
use bot_core::{
    ChatId, ChatTransport, ContentEntry, CredentialPair, EnrichmentConfig, EnrichmentPipeline,
    HostingClient, HostingConnector, HostingError, MenuButton, MessageId, RemoteFile,
    Repository, SessionStore, StateMachine, Step, TokenError, TokenService, TransportError,
};

pub const GOOD_TOKEN: &str = "ghp_good";

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text { chat: ChatId, text: String },
    Menu { chat: ChatId, buttons: Vec<String> },
    Document { chat: ChatId, name: String, caption: String, body: String },
    Edit { chat: ChatId, message: MessageId, text: String },
    Answer(String),
}

#[derive(Default)]
pub struct FakeTransport {
    pub outbound: Mutex<Vec<Outbound>>,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_edits: AtomicBool,
    next_id: AtomicI64,
}

impl FakeTransport {
    pub fn with_file(self, file_id: &str, body: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), body.to_vec());
        self
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.outbound.lock().unwrap().clone()
    }

    pub fn texts(&self, chat: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|out| match out {
                Outbound::Text { chat: c, text } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, chat: ChatId) -> String {
        self.texts(chat).pop().unwrap_or_default()
    }

    pub fn documents(&self, chat: ChatId) -> Vec<(String, String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|out| match out {
                Outbound::Document {
                    chat: c,
                    name,
                    caption,
                    body,
                } if c == chat => Some((name, caption, body)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self, chat: ChatId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|out| match out {
                Outbound::Edit { chat: c, text, .. } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, out: Outbound) {
        self.outbound.lock().unwrap().push(out);
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> TransportResult<MessageId> {
        self.push(Outbound::Text {
            chat,
            text: text.to_string(),
        });
        Ok(self.next_message_id())
    }

    async fn send_menu(
        &self,
        chat: ChatId,
        _text: &str,
        buttons: &[MenuButton],
    ) -> TransportResult<MessageId> {
        self.push(Outbound::Menu {
            chat,
            buttons: buttons.iter().map(|b| b.data.clone()).collect(),
        });
        Ok(self.next_message_id())
    }

    async fn send_document(&self, chat: ChatId, file: &Path, caption: &str) -> TransportResult<()> {
        let body = std::fs::read_to_string(file)?;
        self.push(Outbound::Document {
            chat,
            name: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            caption: caption.to_string(),
            body,
        });
        Ok(())
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> TransportResult<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(TransportError::Api(
                "Bad Request: message is not modified".to_string(),
            ));
        }
        self.push(Outbound::Edit {
            chat,
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()> {
        self.push(Outbound::Answer(callback_id.to_string()));
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> TransportResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| TransportError::Api(format!("file {} not found", file_id)))
    }
}

/// A repository tree plus file bodies with revisions.
#[derive(Default)]
pub struct FakeHostingClient {
    pub repositories: Vec<Repository>,
    pub tree: HashMap<String, Vec<ContentEntry>>,
    pub broken_dirs: HashSet<String>,
    pub files: Mutex<HashMap<String, RemoteFile>>,
    pub commits: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakeHostingClient {
    /// `octo/site` with `README.md`, `src/main.rs`, `src/lib/util.rs` and an
    /// unreadable `vendor/` directory.
    pub fn sample() -> Self {
        let mut tree = HashMap::new();
        tree.insert(
            String::new(),
            vec![
                ContentEntry::file("README.md"),
                ContentEntry::dir("src"),
                ContentEntry::dir("vendor"),
            ],
        );
        tree.insert(
            "src".to_string(),
            vec![ContentEntry::file("src/main.rs"), ContentEntry::dir("src/lib")],
        );
        tree.insert("src/lib".to_string(), vec![ContentEntry::file("src/lib/util.rs")]);

        let mut files = HashMap::new();
        files.insert(
            "README.md".to_string(),
            RemoteFile {
                content: b"# Site".to_vec(),
                revision: "rev-1".to_string(),
            },
        );

        Self {
            repositories: vec![Repository::new("octo/site"), Repository::new("octo/blog")],
            tree,
            broken_dirs: HashSet::from(["vendor".to_string()]),
            files: Mutex::new(files),
            commits: Mutex::new(Vec::new()),
        }
    }

    /// Simulate someone else pushing a change to `path`.
    pub fn touch(&self, path: &str, revision: &str) {
        if let Some(file) = self.files.lock().unwrap().get_mut(path) {
            file.revision = revision.to_string();
        }
    }
}

#[async_trait]
impl HostingClient for FakeHostingClient {
    async fn list_repositories(&self) -> HostingResult<Vec<Repository>> {
        Ok(self.repositories.clone())
    }

    async fn list_contents(&self, _repo: &Repository, path: &str) -> HostingResult<Vec<ContentEntry>> {
        if self.broken_dirs.contains(path) {
            return Err(HostingError::Api("403 Forbidden".to_string()));
        }
        self.tree
            .get(path)
            .cloned()
            .ok_or_else(|| HostingError::NotFound(path.to_string()))
    }

    async fn get_file(&self, _repo: &Repository, path: &str) -> HostingResult<RemoteFile> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| HostingError::NotFound(path.to_string()))
    }

    async fn update_file(
        &self,
        _repo: &Repository,
        path: &str,
        message: &str,
        content: &[u8],
        revision: &str,
    ) -> HostingResult<()> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(path)
            .ok_or_else(|| HostingError::NotFound(path.to_string()))?;
        if file.revision != revision {
            return Err(HostingError::StaleRevision(path.to_string()));
        }
        file.content = content.to_vec();
        file.revision = format!("{}+", revision);
        self.commits
            .lock()
            .unwrap()
            .push((path.to_string(), message.to_string(), content.to_vec()));
        Ok(())
    }
}

pub struct FakeConnector {
    pub client: Arc<FakeHostingClient>,
}

#[async_trait]
impl HostingConnector for FakeConnector {
    async fn connect(&self, token: &str) -> HostingResult<Arc<dyn HostingClient>> {
        if token == GOOD_TOKEN {
            Ok(self.client.clone())
        } else {
            Err(HostingError::Unauthorized)
        }
    }
}

/// Issues `jwt-<uid>` for even numeric uids and fails for the rest, while
/// recording how many lookups were in flight at once.
#[derive(Default)]
pub struct CountingTokenService {
    pub delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl CountingTokenService {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TokenService for CountingTokenService {
    async fn fetch_token(&self, pair: &CredentialPair) -> Result<String, TokenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match pair.uid.parse::<u64>() {
            Ok(n) if n % 2 == 0 => Ok(format!("jwt-{}", pair.uid)),
            _ => Err(TokenError::Status(500)),
        }
    }
}

pub struct Harness {
    pub machine: Arc<StateMachine>,
    pub transport: Arc<FakeTransport>,
    pub hosting: Arc<FakeHostingClient>,
    pub tokens: Arc<CountingTokenService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_transport(FakeTransport::default())
    }

    pub fn with_transport(transport: FakeTransport) -> Self {
        let transport = Arc::new(transport);
        let hosting = Arc::new(FakeHostingClient::sample());
        let tokens = Arc::new(CountingTokenService::default());
        let pipeline = EnrichmentPipeline::new(tokens.clone()).with_config(EnrichmentConfig {
            lookup_timeout: Duration::from_secs(1),
            ..EnrichmentConfig::default()
        });
        let machine = Arc::new(StateMachine::new(
            Arc::new(SessionStore::new()),
            transport.clone(),
            Arc::new(FakeConnector {
                client: hosting.clone(),
            }),
            pipeline,
        ));
        Self {
            machine,
            transport,
            hosting,
            tokens,
        }
    }

    pub async fn step(&self, chat: ChatId) -> Step {
        self.machine
            .sessions()
            .get_or_create(chat)
            .lock()
            .await
            .step
            .clone()
    }

    pub async fn has_hosting(&self, chat: ChatId) -> bool {
        self.machine
            .sessions()
            .get_or_create(chat)
            .lock()
            .await
            .has_hosting()
    }
}
