//! Core of the super-bot: per-chat sessions, the workflow state machine,
//! the credential extraction engine and the token enrichment pipeline.
//!
//! The chat platform, the hosting service and the token service are reached
//! only through the traits in [`ports`].

pub mod artifact;
pub mod dispatcher;
pub mod enrichment;
pub mod error;
pub mod extraction;
pub mod machine;
pub mod ports;
pub mod session;
pub mod types;

pub use dispatcher::Dispatcher;
pub use enrichment::{EnrichmentConfig, EnrichmentPipeline};
pub use error::{HostingError, TokenError, TransportError};
pub use extraction::extract;
pub use machine::{EventKind, InboundEvent, MenuChoice, StateMachine};
pub use ports::{
    ChatTransport, HostingClient, HostingConnector, MenuButton, ProgressReporter, TokenService,
};
pub use session::{Session, SessionHandle, SessionStore, Step};
pub use types::{
    ChatId, ContentEntry, ContentKind, CredentialPair, MessageId, RemoteFile, RemoteFileHandle,
    Repository, TokenResult,
};
