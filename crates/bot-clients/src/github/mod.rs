//! GitHub REST adapter for the remote file editor
//!
//! Every request carries the token as a bearer header. Writes send the blob
//! `sha` captured at read time, so GitHub itself rejects stale edits.

mod models;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bot_core::error::HostingResult;
use bot_core::{
    ContentEntry, HostingClient, HostingConnector, HostingError, RemoteFile, Repository,
};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use models::{ContentsResponse, RepoItem, UpdateRequest};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

/// Creates a [`GithubClient`] per token after checking the token against
/// `GET /user`.
pub struct GithubConnector {
    client: Client,
    api_base: String,
    timeout: Duration,
}

impl GithubConnector {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_GITHUB_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for GithubConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostingConnector for GithubConnector {
    async fn connect(&self, token: &str) -> HostingResult<Arc<dyn HostingClient>> {
        let token = token.trim();
        if token.is_empty() {
            return Err(HostingError::Unauthorized);
        }

        let client = GithubClient {
            http: self.client.clone(),
            api_base: self.api_base.clone(),
            token: token.to_string(),
            timeout: self.timeout,
        };
        client.verify().await?;
        Ok(Arc::new(client))
    }
}

pub struct GithubClient {
    http: Client,
    api_base: String,
    token: String,
    timeout: Duration,
}

impl GithubClient {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_to(method, format!("{}{}", self.api_base, path))
    }

    fn request_to(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(USER_AGENT, "super-bot")
            .header(ACCEPT, "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
            .timeout(self.timeout)
    }

    async fn verify(&self) -> HostingResult<()> {
        let response = send(self.request(Method::GET, "/user")).await?;
        check(response, "/user").await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> HostingResult<T> {
        read_json(self.request(Method::GET, path), path).await
    }

    async fn contents(&self, repo: &Repository, path: &str) -> HostingResult<ContentsResponse> {
        let url = contents_url(&self.api_base, repo, path)?;
        read_json(self.request_to(Method::GET, url), path).await
    }
}

#[async_trait]
impl HostingClient for GithubClient {
    async fn list_repositories(&self) -> HostingResult<Vec<Repository>> {
        let mut repositories = Vec::new();
        let mut page = 1_u32;
        loop {
            let chunk: Vec<RepoItem> = self
                .get_json(&format!("/user/repos?per_page={}&page={}", PAGE_SIZE, page))
                .await?;
            let chunk_len = chunk.len();
            repositories.extend(chunk.into_iter().map(Repository::from));
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        log::debug!("Listed {} repositories", repositories.len());
        Ok(repositories)
    }

    async fn list_contents(
        &self,
        repo: &Repository,
        path: &str,
    ) -> HostingResult<Vec<ContentEntry>> {
        match self.contents(repo, path).await? {
            ContentsResponse::Dir(items) => Ok(items.into_iter().map(ContentEntry::from).collect()),
            ContentsResponse::File(_) => Err(HostingError::InvalidContent(format!(
                "`{}` is a file, not a directory",
                path
            ))),
        }
    }

    async fn get_file(&self, repo: &Repository, path: &str) -> HostingResult<RemoteFile> {
        let file = match self.contents(repo, path).await? {
            ContentsResponse::File(file) => file,
            ContentsResponse::Dir(_) => {
                return Err(HostingError::InvalidContent(format!(
                    "`{}` is a directory",
                    path
                )))
            }
        };

        let content = match (file.encoding.as_deref(), file.content) {
            (Some("base64"), Some(encoded)) => decode_content(&encoded)?,
            (_, Some(raw)) if !raw.is_empty() => raw.into_bytes(),
            // Files over 1 MB come back without inline content.
            _ => {
                return Err(HostingError::InvalidContent(format!(
                    "`{}` is too large to edit here",
                    path
                )))
            }
        };

        Ok(RemoteFile {
            content,
            revision: file.sha,
        })
    }

    async fn update_file(
        &self,
        repo: &Repository,
        path: &str,
        message: &str,
        content: &[u8],
        revision: &str,
    ) -> HostingResult<()> {
        let body = UpdateRequest {
            message,
            content: STANDARD.encode(content),
            sha: revision,
        };
        let url = contents_url(&self.api_base, repo, path)?;
        let response = send(self.request_to(Method::PUT, url).json(&body)).await?;
        check(response, path).await?;
        Ok(())
    }
}

/// `{api}/repos/{owner}/{name}/contents/{path}`, each segment percent-encoded
/// so names containing `#`, `?` or spaces address the right file.
fn contents_url(api_base: &str, repo: &Repository, path: &str) -> HostingResult<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|e| HostingError::Http(format!("invalid API URL {}: {}", api_base, e)))?;
    url.path_segments_mut()
        .map_err(|_| HostingError::Http(format!("invalid API URL {}", api_base)))?
        .pop_if_empty()
        .push("repos")
        .extend(repo.full_name.split('/'))
        .push("contents")
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(request: RequestBuilder, subject: &str) -> HostingResult<T> {
    let response = check(send(request).await?, subject).await?;
    response
        .json()
        .await
        .map_err(|e| HostingError::InvalidContent(e.to_string()))
}

/// GitHub wraps base64 at 60 columns.
fn decode_content(encoded: &str) -> HostingResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| HostingError::InvalidContent(e.to_string()))
}

async fn send(request: RequestBuilder) -> HostingResult<Response> {
    request
        .send()
        .await
        .map_err(|e| HostingError::Http(e.to_string()))
}

/// Map error statuses onto [`HostingError`]; `subject` names what was asked for.
async fn check(response: Response, subject: &str) -> HostingResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    log::debug!("GitHub returned {} for {}: {}", status, subject, text);
    match status {
        StatusCode::UNAUTHORIZED => Err(HostingError::Unauthorized),
        StatusCode::NOT_FOUND => Err(HostingError::NotFound(subject.to_string())),
        StatusCode::CONFLICT => Err(HostingError::StaleRevision(subject.to_string())),
        StatusCode::UNPROCESSABLE_ENTITY if text.to_lowercase().contains("sha") => {
            Err(HostingError::StaleRevision(subject.to_string()))
        }
        _ => Err(HostingError::Api(format!("HTTP {}: {}", status, text))),
    }
}
