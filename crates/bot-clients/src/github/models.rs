//! Wire types of the GitHub REST API (only the fields we read)

use bot_core::{ContentEntry, ContentKind, Repository};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct RepoItem {
    pub full_name: String,
}

impl From<RepoItem> for Repository {
    fn from(item: RepoItem) -> Self {
        Repository::new(item.full_name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<ContentItem> for ContentEntry {
    fn from(item: ContentItem) -> Self {
        // Symlinks and submodules are listed like files.
        let kind = if item.kind == "dir" {
            ContentKind::Dir
        } else {
            ContentKind::File
        };
        ContentEntry {
            path: item.path,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileItem {
    pub sha: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// The contents endpoint answers with an array for directories and an
/// object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
    Dir(Vec<ContentItem>),
    File(FileItem),
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub sha: &'a str,
}
