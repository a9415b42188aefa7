use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use vendebot_core::dialog::events::{ChatId, MessageId};
use vendebot_core::keyboard::Keyboard;

use crate::render::InlineKeyboardMarkup;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Http(String),
    #[error("telegram rejected {method}: {description}")]
    Api { method: &'static str, description: String },
}

/// Outbound side of the Bot API, narrowed to the three calls the dialog
/// needs. Tests swap in a recording implementation.
#[async_trait]
pub trait TelegramTransport: Send + Sync {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<(), TransportError>;

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    async fn answer_callback(
        &self,
        callback_id: &str,
        toast: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError>;
}

pub struct HttpTelegramTransport {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    description: Option<String>,
}

impl HttpTelegramTransport {
    pub fn new(
        api_base_url: &str,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Http(err.to_string()))?;

        Ok(Self { http, base_url: api_base_url.trim_end_matches('/').to_string(), token })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token.expose_secret(), method)
    }

    async fn call(
        &self,
        method: &'static str,
        payload: serde_json::Value,
    ) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.endpoint(method))
            .json(&payload)
            .send()
            .await
            .map_err(|err| TransportError::Http(err.to_string()))?;

        let status = response.status();
        let reply: ApiReply = response.json().await.map_err(|err| {
            TransportError::Http(format!("decoding {method} reply (status {status}): {err}"))
        })?;

        if !reply.ok {
            let description =
                reply.description.unwrap_or_else(|| format!("status {status}, no description"));
            error!(method, %description, "telegram api call rejected");
            return Err(TransportError::Api { method, description });
        }

        Ok(())
    }

    fn markup(keyboard: &Keyboard) -> Result<serde_json::Value, TransportError> {
        serde_json::to_value(InlineKeyboardMarkup::from(keyboard))
            .map_err(|err| TransportError::Http(err.to_string()))
    }
}

#[async_trait]
impl TelegramTransport for HttpTelegramTransport {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
        reply_to: Option<MessageId>,
    ) -> Result<(), TransportError> {
        let mut payload = json!({
            "chat_id": chat_id.0,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(reply_to) = reply_to {
            payload["reply_to_message_id"] = json!(reply_to.0);
        }
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = Self::markup(keyboard)?;
        }

        self.call("sendMessage", payload).await
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut payload = json!({
            "chat_id": chat_id.0,
            "message_id": message_id.0,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(keyboard) = keyboard {
            payload["reply_markup"] = Self::markup(keyboard)?;
        }

        self.call("editMessageText", payload).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        toast: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(toast) = toast {
            payload["text"] = json!(toast);
        }
        if show_alert {
            payload["show_alert"] = json!(true);
        }

        self.call("answerCallbackQuery", payload).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ApiReply, HttpTelegramTransport};

    #[test]
    fn endpoint_joins_base_token_and_method() {
        let transport = HttpTelegramTransport::new(
            "https://api.telegram.org/",
            "12345:test-token".to_string().into(),
            Duration::from_secs(30),
        )
        .expect("build transport");

        assert_eq!(
            transport.endpoint("sendMessage"),
            "https://api.telegram.org/bot12345:test-token/sendMessage"
        );
    }

    #[test]
    fn api_reply_decodes_failure_description() {
        let reply: ApiReply =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request"}"#)
                .expect("decode");
        assert!(!reply.ok);
        assert_eq!(reply.description.as_deref(), Some("Bad Request"));

        let reply: ApiReply =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":1}}"#).expect("decode");
        assert!(reply.ok);
        assert_eq!(reply.description, None);
    }
}
