//! Session record - the per-chat state the workflow machine operates on

use std::fmt;
use std::sync::Arc;

use crate::ports::HostingClient;
use crate::types::{RemoteFileHandle, Repository};

/// The workflow step a chat is in.
///
/// Each variant carries only what its workflow needs, so moving to another
/// workflow drops the previous workflow's fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Step {
    /// No workflow is active.
    #[default]
    Idle,

    // ========== Remote File Editor ==========
    /// Waiting for a hosting access token.
    AwaitingHostingToken,

    /// Repositories were listed; waiting for a name or index.
    SelectingRepository { repositories: Vec<Repository> },

    /// Files of `repository` were listed; waiting for a path or index.
    SelectingFile {
        repository: Repository,
        files: Vec<String>,
    },

    /// A file was read; waiting for its replacement content.
    EditingFile {
        repository: Repository,
        file: RemoteFileHandle,
    },

    // ========== Token Generator ==========
    /// Waiting for a JSON file of accounts.
    AwaitingCredentialFile,

    // ========== Text Extractor ==========
    /// Waiting for text or a file to extract pairs from.
    AwaitingFreeTextOrFile,
}

impl Step {
    /// Short stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::AwaitingHostingToken => "awaiting_hosting_token",
            Step::SelectingRepository { .. } => "selecting_repository",
            Step::SelectingFile { .. } => "selecting_file",
            Step::EditingFile { .. } => "editing_file",
            Step::AwaitingCredentialFile => "awaiting_credential_file",
            Step::AwaitingFreeTextOrFile => "awaiting_free_text_or_file",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Step::Idle)
    }
}

/// One chat's session.
#[derive(Default, Clone)]
pub struct Session {
    pub step: Step,
    /// Authenticated hosting client, kept between editor runs until the
    /// session is cleared.
    pub hosting: Option<Arc<dyn HostingClient>>,
}

impl Session {
    /// Drops every field and returns to [`Step::Idle`].
    pub fn clear(&mut self) {
        *self = Session::default();
    }

    pub fn has_hosting(&self) -> bool {
        self.hosting.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("step", &self.step)
            .field("hosting", &self.hosting.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_is_idle() {
        let session = Session::default();
        assert!(session.step.is_idle());
        assert!(!session.has_hosting());
    }

    #[test]
    fn test_clear_drops_workflow_fields() {
        let mut session = Session {
            step: Step::SelectingFile {
                repository: Repository::new("octo/repo"),
                files: vec!["README.md".to_string()],
            },
            hosting: None,
        };
        session.clear();
        assert_eq!(session.step, Step::Idle);
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::Idle.name(), "idle");
        assert_eq!(
            Step::SelectingRepository {
                repositories: vec![]
            }
            .name(),
            "selecting_repository"
        );
    }
}
