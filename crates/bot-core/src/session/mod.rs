//! Per-chat session state and its store.

mod state;
mod store;

pub use state::{Session, Step};
pub use store::{SessionHandle, SessionStore};
