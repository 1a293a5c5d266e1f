//! Remote file editor workflow

use futures::future::{BoxFuture, FutureExt};

use super::StateMachine;
use crate::error::HostingError;
use crate::ports::HostingClient;
use crate::session::{Session, Step};
use crate::types::{ChatId, ContentKind, RemoteFileHandle, Repository};

pub(super) const TEXT_COMMIT_MESSAGE: &str = "Updated via Telegram";
pub(super) const UPLOAD_COMMIT_MESSAGE: &str = "Updated via upload";

/// Entries shown per numbered list.
const LIST_LIMIT: usize = 50;
/// Characters of file content echoed back before editing.
const PREVIEW_CHARS: usize = 3500;

impl StateMachine {
    pub(super) async fn receive_hosting_token(
        &self,
        chat: ChatId,
        session: &mut Session,
        token: &str,
    ) -> Step {
        match self.hosting.connect(token).await {
            Ok(client) => {
                session.hosting = Some(client.clone());
                self.say(chat, "✅ GitHub token saved! Now listing repositories...")
                    .await;
                self.list_repositories(chat, client.as_ref()).await
            }
            Err(e) => {
                log::info!("[{}] Hosting token rejected: {}", chat, e);
                self.say(chat, &format!("❌ Invalid GitHub token or error: `{}`.", e))
                    .await;
                Step::AwaitingHostingToken
            }
        }
    }

    pub(super) async fn list_repositories(&self, chat: ChatId, client: &dyn HostingClient) -> Step {
        self.say(chat, "⏳ Fetching your GitHub repositories...").await;
        match client.list_repositories().await {
            Ok(repositories) if repositories.is_empty() => {
                self.say(chat, "⚠️ No repositories found.").await;
                Step::Idle
            }
            Ok(repositories) => {
                let names: Vec<String> = repositories
                    .iter()
                    .map(|repo| repo.full_name.clone())
                    .collect();
                self.say(chat, &numbered_list(&names, "Your Repositories"))
                    .await;
                self.say(
                    chat,
                    "➡️ Send the *number* or *full name* of the repo to open.",
                )
                .await;
                Step::SelectingRepository { repositories }
            }
            Err(e) => {
                log::warn!("[{}] Failed to list repositories: {}", chat, e);
                self.say(chat, &format!("❌ Error fetching repos:\n`{}`", e))
                    .await;
                Step::Idle
            }
        }
    }

    pub(super) async fn select_repository(
        &self,
        chat: ChatId,
        session: &Session,
        repositories: Vec<Repository>,
        text: &str,
    ) -> Step {
        let Some(client) = session.hosting.clone() else {
            return self.lost_hosting(chat).await;
        };
        let Some(repository) = resolve_repository(&repositories, text) else {
            self.say(chat, "⚠️ Invalid repo.").await;
            return Step::SelectingRepository { repositories };
        };

        self.say(
            chat,
            &format!("✅ Selected: *{}*\n⏳ Listing files...", repository.full_name),
        )
        .await;
        let files = list_files(client.as_ref(), &repository, "").await;
        if files.is_empty() {
            self.say(chat, "⚠️ No files found.").await;
            return Step::Idle;
        }

        self.say(chat, &numbered_list(&files, "Files in Repo")).await;
        self.say(chat, "➡️ Send *file number* or *path* to edit.").await;
        Step::SelectingFile { repository, files }
    }

    pub(super) async fn select_file(
        &self,
        chat: ChatId,
        session: &Session,
        repository: Repository,
        files: Vec<String>,
        text: &str,
    ) -> Step {
        let Some(client) = session.hosting.clone() else {
            return self.lost_hosting(chat).await;
        };
        let path = resolve_index(&files, text)
            .cloned()
            .unwrap_or_else(|| text.to_string());

        match client.get_file(&repository, &path).await {
            Ok(file) => {
                let content = String::from_utf8_lossy(&file.content);
                let preview: String = content.chars().take(PREVIEW_CHARS).collect();
                self.say(
                    chat,
                    &format!("*Current content of `{}`:*\n\n```\n{}\n```", path, preview),
                )
                .await;
                self.say(chat, "✏️ Send new text or upload a file to replace.")
                    .await;
                Step::EditingFile {
                    repository,
                    file: RemoteFileHandle {
                        path,
                        revision: file.revision,
                    },
                }
            }
            Err(e) => {
                log::warn!("[{}] Failed to read {}: {}", chat, path, e);
                self.say(chat, &format!("❌ Error reading file `{}`:\n`{}`", path, e))
                    .await;
                Step::Idle
            }
        }
    }

    pub(super) async fn write_uploaded_file(
        &self,
        chat: ChatId,
        session: &mut Session,
        repository: Repository,
        file: RemoteFileHandle,
        file_id: &str,
    ) -> Step {
        let bytes = match self.transport.download_file(file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.say(chat, &format!("❌ Update failed:\n`{}`", e)).await;
                session.clear();
                return Step::Idle;
            }
        };
        if std::str::from_utf8(&bytes).is_err() {
            self.say(chat, "❌ Update failed:\n`file is not valid UTF-8`")
                .await;
            session.clear();
            return Step::Idle;
        }
        self.write_file(chat, session, repository, file, bytes, UPLOAD_COMMIT_MESSAGE)
            .await
    }

    /// Write `content` using the revision captured when the file was read.
    /// Any failure clears the session.
    pub(super) async fn write_file(
        &self,
        chat: ChatId,
        session: &mut Session,
        repository: Repository,
        file: RemoteFileHandle,
        content: Vec<u8>,
        message: &str,
    ) -> Step {
        let Some(client) = session.hosting.clone() else {
            return self.lost_hosting(chat).await;
        };

        match client
            .update_file(&repository, &file.path, message, &content, &file.revision)
            .await
        {
            Ok(()) => {
                log::info!("[{}] Updated {}/{}", chat, repository.full_name, file.path);
                let text = if message == UPLOAD_COMMIT_MESSAGE {
                    format!("✅ File `{}` updated via upload.", file.path)
                } else {
                    format!("✅ File `{}` updated!", file.path)
                };
                self.say(chat, &text).await;
                Step::Idle
            }
            Err(HostingError::StaleRevision(path)) => {
                log::warn!("[{}] Stale revision for {}", chat, path);
                self.say(
                    chat,
                    &format!(
                        "❌ `{}` was changed on GitHub after you opened it. \
                         Nothing was written; open the file again to edit the latest version.",
                        path
                    ),
                )
                .await;
                session.clear();
                Step::Idle
            }
            Err(e) => {
                log::warn!("[{}] Failed to update {}: {}", chat, file.path, e);
                self.say(chat, &format!("❌ Failed to update file:\n`{}`", e))
                    .await;
                session.clear();
                Step::Idle
            }
        }
    }

    async fn lost_hosting(&self, chat: ChatId) -> Step {
        log::warn!("[{}] Editor step without a hosting client", chat);
        self.say(chat, super::USE_MENU).await;
        Step::Idle
    }
}

/// Collect every file path under `path`, depth first. Directories that
/// cannot be listed contribute nothing.
pub(crate) fn list_files<'a>(
    client: &'a dyn HostingClient,
    repo: &'a Repository,
    path: &'a str,
) -> BoxFuture<'a, Vec<String>> {
    async move {
        let entries = match client.list_contents(repo, path).await {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Skipping `{}` in {}: {}", path, repo.full_name, e);
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            match entry.kind {
                ContentKind::Dir => files.extend(list_files(client, repo, &entry.path).await),
                ContentKind::File => files.push(entry.path),
            }
        }
        files
    }
    .boxed()
}

fn resolve_repository(repositories: &[Repository], text: &str) -> Option<Repository> {
    repositories
        .iter()
        .find(|repo| repo.full_name.eq_ignore_ascii_case(text))
        .or_else(|| resolve_index(repositories, text))
        .cloned()
}

/// Resolve a 1-based index typed by the user.
fn resolve_index<'a, T>(items: &'a [T], text: &str) -> Option<&'a T> {
    let index: usize = text.parse().ok()?;
    index.checked_sub(1).and_then(|i| items.get(i))
}

fn numbered_list(items: &[String], title: &str) -> String {
    let mut text = format!("*{}* - total: {}\n\n", title, items.len());
    for (i, item) in items.iter().take(LIST_LIMIT).enumerate() {
        text.push_str(&format!("{}. `{}`\n", i + 1, item));
    }
    if items.len() > LIST_LIMIT {
        text.push_str(&format!("\n_Showing first {}._", LIST_LIMIT));
    }
    text
}
