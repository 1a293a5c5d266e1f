//! Client for the external `uid`/`password` -> JWT service

use std::time::Duration;

use async_trait::async_trait;
use bot_core::{CredentialPair, TokenError, TokenService};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

pub const DEFAULT_TOKEN_SERVICE_URL: &str = "https://jwttoken-ten.vercel.app";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

pub struct TokenServiceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl TokenServiceClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_TOKEN_SERVICE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TokenServiceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenService for TokenServiceClient {
    async fn fetch_token(&self, pair: &CredentialPair) -> Result<String, TokenError> {
        let response = self
            .client
            .get(format!("{}/token", self.base_url))
            .query(&[("uid", pair.uid.as_str()), ("password", pair.password.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_error)?;

        if response.status() != StatusCode::OK {
            return Err(TokenError::Status(response.status().as_u16()));
        }

        let body: TokenResponse = response.json().await.map_err(map_error)?;
        match body.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(TokenError::MissingToken),
        }
    }
}

fn map_error(e: reqwest::Error) -> TokenError {
    if e.is_timeout() {
        TokenError::Timeout
    } else {
        TokenError::Http(e.to_string())
    }
}
