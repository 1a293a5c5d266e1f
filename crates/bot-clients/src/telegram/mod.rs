//! Telegram Bot API adapter
//!
//! Methods are called as `POST {api}/bot{token}/{method}` and answer with
//! the `{ok, result, description}` envelope.

mod update;

pub use update::{CallbackQuery, Chat, Document, Message, Update};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bot_core::error::TransportResult;
use bot_core::{ChatId, ChatTransport, MenuButton, MessageId, TransportError};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

const PARSE_MODE: &str = "Markdown";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    #[serde(default)]
    file_path: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_TELEGRAM_API_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> TransportResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        unwrap_envelope(method, response).await
    }

    /// Send a Markdown message, retrying as plain text when Telegram cannot
    /// parse the markup (user-supplied file contents often break it).
    async fn send_message(&self, mut body: Value) -> TransportResult<MessageId> {
        body["parse_mode"] = json!(PARSE_MODE);
        let first = self.call::<SentMessage>("sendMessage", &body).await;
        let sent = match first {
            Err(TransportError::Api(description)) if is_markup_error(&description) => {
                log::debug!("Resending without markup: {}", description);
                if let Some(fields) = body.as_object_mut() {
                    fields.remove("parse_mode");
                }
                self.call("sendMessage", &body).await?
            }
            other => other?,
        };
        Ok(MessageId(sent.message_id))
    }

    /// Replace the webhook: drop the current one, wait briefly, register `url`.
    pub async fn register_webhook(&self, url: &str) -> TransportResult<()> {
        self.delete_webhook().await?;
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.set_webhook(url).await
    }

    pub async fn set_webhook(&self, url: &str) -> TransportResult<()> {
        let _: bool = self.call("setWebhook", &json!({ "url": url })).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> TransportResult<()> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> TransportResult<MessageId> {
        self.send_message(json!({ "chat_id": chat.0, "text": text }))
            .await
    }

    async fn send_menu(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[MenuButton],
    ) -> TransportResult<MessageId> {
        // One button per row.
        let keyboard: Vec<Vec<Value>> = buttons
            .iter()
            .map(|b| vec![json!({ "text": b.label, "callback_data": b.data })])
            .collect();
        self.send_message(json!({
            "chat_id": chat.0,
            "text": text,
            "reply_markup": { "inline_keyboard": keyboard },
        }))
        .await
    }

    async fn send_document(&self, chat: ChatId, file: &Path, caption: &str) -> TransportResult<()> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = Form::new()
            .text("chat_id", chat.0.to_string())
            .text("caption", caption.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));
        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let _: SentMessage = unwrap_envelope("sendDocument", response).await?;
        Ok(())
    }

    async fn edit_text(&self, chat: ChatId, message: MessageId, text: &str) -> TransportResult<()> {
        let body = json!({
            "chat_id": chat.0,
            "message_id": message.0,
            "text": text,
            "parse_mode": PARSE_MODE,
        });
        // Result is the edited message, or `true` for inline messages.
        let _: Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> TransportResult<Vec<u8>> {
        let info: FileInfo = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let file_path = info
            .file_path
            .ok_or_else(|| TransportError::Api(format!("file {} has no download path", file_id)))?;

        let response = self
            .client
            .get(format!("{}/file/bot{}/{}", self.api_base, self.token, file_path))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TransportError::Api(format!(
                "file download failed: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> TransportResult<T> {
    let status = response.status();
    let envelope: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| TransportError::Http(format!("{} returned HTTP {}: {}", method, status, e)))?;

    match (envelope.ok, envelope.result) {
        (true, Some(result)) => Ok(result),
        (true, None) => Err(TransportError::Api(format!("{} returned no result", method))),
        (false, _) => Err(TransportError::Api(
            envelope
                .description
                .unwrap_or_else(|| format!("{} failed with HTTP {}", method, status)),
        )),
    }
}

fn is_markup_error(description: &str) -> bool {
    description.contains("can't parse entities")
}
