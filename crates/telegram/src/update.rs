use serde::Deserialize;
use thiserror::Error;

use vendebot_core::dialog::events::{
    ButtonData, ButtonPressEvent, ChatId, InboundEvent, MessageEvent, MessageId,
};

/// One webhook delivery. Telegram sends many more update kinds (edits,
/// channel posts, member changes); everything this struct does not name is
/// ignored on purpose.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub message: Option<IncomingMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<Sender>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub message: Option<IncomingMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateDecodeError {
    #[error("callback query `{0}` carries no message to anchor the reply")]
    MissingCallbackMessage(String),
}

/// Turns a decoded webhook payload into an inbound event, or `None` when the
/// update is not something the dialog reacts to (no text, unsupported kind).
pub fn decode_update(update: Update) -> Result<Option<InboundEvent>, UpdateDecodeError> {
    if let Some(callback) = update.callback_query {
        let Some(message) = callback.message else {
            return Err(UpdateDecodeError::MissingCallbackMessage(callback.id));
        };
        let data = callback.data.unwrap_or_default();
        return Ok(Some(InboundEvent::ButtonPress(ButtonPressEvent {
            chat_id: ChatId(message.chat.id),
            message_id: MessageId(message.message_id),
            callback_id: callback.id,
            data: ButtonData::parse(&data),
        })));
    }

    let Some(message) = update.message else {
        return Ok(None);
    };
    let text = message.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(None);
    }
    let sender_name = message
        .from
        .and_then(|sender| sender.first_name)
        .unwrap_or_else(|| "Usuario".to_string());

    Ok(Some(InboundEvent::Message(MessageEvent {
        chat_id: ChatId(message.chat.id),
        message_id: MessageId(message.message_id),
        sender_name,
        text: text.to_string(),
    })))
}
