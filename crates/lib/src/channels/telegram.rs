//! Telegram channel: poll getUpdates and reply via sendMessage on the Bot API.

use crate::channels::{DeliveryError, InboundMessage, MessageDispatcher, UpdateFeed};
use crate::config::DEFAULT_TELEGRAM_API_BASE;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    /// Unix seconds.
    pub date: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

impl TelegramUpdate {
    /// Convert to an inbound message. Updates without a text message or without a sender yield None.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let msg = self.message?;
        let text = msg.text?;
        let sender = msg.from?;
        Some(InboundMessage {
            conversation_id: msg.chat.id,
            sender_id: sender.id,
            message_id: msg.message_id,
            sent_at: msg.date,
            text,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Request(reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
}

/// Request URLs carry the bot token; errors keep none of it.
impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Request(e.without_url())
    }
}

/// Telegram Bot API client: fetches pending updates and sends text replies.
#[derive(Clone)]
pub struct TelegramChannel {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: impl Into<String>, base_url: Option<String>) -> Self {
        Self::with_client(token, base_url, reqwest::Client::new())
    }

    /// Same as [`TelegramChannel::new`] but reuses an existing HTTP client (shared timeouts, pool).
    pub fn with_client(
        token: impl Into<String>,
        base_url: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string());
        Self {
            token: token.into(),
            base_url,
            client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// GET getUpdates. No offset is sent, so previously returned updates may come back;
    /// deduplication belongs to the caller. Non-text updates are dropped here.
    pub async fn get_updates(&self) -> Result<Vec<InboundMessage>, TelegramError> {
        let res = self.client.get(self.method_url("getUpdates")).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TelegramError::Api(format!(
                "getUpdates failed: {} {}",
                status, body
            )));
        }
        let data: GetUpdatesResponse = res.json().await?;
        if !data.ok {
            return Err(TelegramError::Api("getUpdates returned ok: false".to_string()));
        }
        let messages = data
            .result
            .into_iter()
            .filter_map(|u| {
                let update_id = u.update_id;
                let inbound = u.into_inbound();
                if inbound.is_none() {
                    log::debug!("telegram: skipping update {} without text message", update_id);
                }
                inbound
            })
            .collect();
        Ok(messages)
    }

    /// POST sendMessage with form fields `chat_id` and `text`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let chat_id = chat_id.to_string();
        let form = [("chat_id", chat_id.as_str()), ("text", text)];
        let res = self
            .client
            .post(self.method_url("sendMessage"))
            .form(&form)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(TelegramError::Api(format!(
                "sendMessage failed: {} {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UpdateFeed for TelegramChannel {
    async fn fetch_pending(&self) -> Vec<InboundMessage> {
        match self.get_updates().await {
            Ok(messages) => messages,
            Err(e) => {
                log::warn!("error fetching updates: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl MessageDispatcher for TelegramChannel {
    async fn send(&self, conversation_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.send_message(conversation_id, text)
            .await
            .map_err(|e| DeliveryError {
                conversation_id,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> TelegramUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_message_converts() {
        let u = update(
            r#"{"update_id": 10, "message": {"message_id": 7, "date": 1700000000,
                "chat": {"id": -42}, "from": {"id": 99, "is_bot": false}, "text": "Paris"}}"#,
        );
        let m = u.into_inbound().unwrap();
        assert_eq!(
            m,
            InboundMessage {
                conversation_id: -42,
                sender_id: 99,
                message_id: 7,
                sent_at: 1_700_000_000,
                text: "Paris".to_string(),
            }
        );
    }

    #[test]
    fn sticker_without_text_is_dropped() {
        let u = update(
            r#"{"update_id": 11, "message": {"message_id": 8, "date": 1,
                "chat": {"id": 1}, "from": {"id": 2}, "sticker": {}}}"#,
        );
        assert!(u.into_inbound().is_none());
    }

    #[test]
    fn edited_message_update_is_dropped() {
        let u = update(r#"{"update_id": 12, "edited_message": {"message_id": 1}}"#);
        assert!(u.into_inbound().is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let t = TelegramChannel::new("123:abc", Some("http://localhost:8081/".to_string()));
        assert_eq!(
            t.method_url("getUpdates"),
            "http://localhost:8081/bot123:abc/getUpdates"
        );
    }
}
