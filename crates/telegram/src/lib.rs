//! Telegram integration - webhook bot interface
//!
//! This crate connects the dialog engine to the Telegram Bot API:
//! - **Updates** (`update`) - webhook payload decoding into inbound events
//! - **Rendering** (`render`) - inline keyboard markup for the Bot API
//! - **Client** (`client`) - HTTP transport for `sendMessage`,
//!   `editMessageText` and `answerCallbackQuery`
//! - **Dispatch** (`dispatch`) - authorize, lock the chat session, run the
//!   dialog engine, deliver the reply

pub mod client;
pub mod dispatch;
pub mod render;
pub mod update;

pub use client::{HttpTelegramTransport, TelegramTransport, TransportError};
pub use dispatch::EventDispatcher;
pub use update::{decode_update, Update, UpdateDecodeError};
