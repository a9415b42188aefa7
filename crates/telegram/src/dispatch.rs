use std::sync::Arc;

use tracing::info;

use vendebot_core::dialog::engine::{DialogEngine, DialogReply, OutboundMessage};
use vendebot_core::dialog::events::{ChatId, InboundEvent};
use vendebot_core::dialog::store::SessionStore;
use vendebot_core::sale::{CustomerDirectory, SaleLedger};

use crate::client::{TelegramTransport, TransportError};

/// Routes one decoded update end to end: allow-list check, session lock,
/// dialog transition, reply delivery. The session lock stays held through
/// delivery so replies for one chat reach Telegram in transition order.
pub struct EventDispatcher<D, L> {
    engine: DialogEngine<D, L>,
    store: SessionStore,
    transport: Arc<dyn TelegramTransport>,
    allowed_chats: Vec<i64>,
}

impl<D, L> EventDispatcher<D, L>
where
    D: CustomerDirectory,
    L: SaleLedger,
{
    pub fn new(
        engine: DialogEngine<D, L>,
        store: SessionStore,
        transport: Arc<dyn TelegramTransport>,
        allowed_chats: Vec<i64>,
    ) -> Self {
        Self { engine, store, transport, allowed_chats }
    }

    /// Empty allow-list means open access.
    fn is_authorized(&self, chat_id: ChatId) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id.0)
    }

    pub async fn dispatch(&self, event: InboundEvent) -> Result<(), TransportError> {
        let chat_id = event.chat_id();
        info!(
            event_name = "ingress.telegram.update_received",
            chat_id = chat_id.0,
            kind = event.kind(),
            "update received"
        );

        if !self.is_authorized(chat_id) {
            info!(
                event_name = "ingress.telegram.unauthorized_chat",
                chat_id = chat_id.0,
                "chat is not in the allow-list"
            );
            return self.refuse(&event).await;
        }

        let cell = self.store.get_or_create(chat_id).await;
        let mut session = cell.lock().await;
        let reply = self.engine.handle(&mut session, &event).await;
        self.deliver(chat_id, reply).await
    }

    async fn refuse(&self, event: &InboundEvent) -> Result<(), TransportError> {
        match event {
            InboundEvent::Message(message) => {
                let text = format!(
                    "⛔ No tienes permiso para usar este bot.\n\
                     Tu ID es: <code>{}</code>\n\
                     Contacta al administrador para solicitar acceso.",
                    message.chat_id
                );
                self.transport
                    .send_message(message.chat_id, &text, None, Some(message.message_id))
                    .await
            }
            InboundEvent::ButtonPress(press) => {
                self.transport
                    .answer_callback(&press.callback_id, Some("⛔ No autorizado"), false)
                    .await
            }
        }
    }

    async fn deliver(&self, chat_id: ChatId, reply: DialogReply) -> Result<(), TransportError> {
        if let Some(ack) = reply.ack {
            self.transport
                .answer_callback(&ack.callback_id, ack.toast.as_deref(), ack.show_alert)
                .await?;
        }

        match reply.message {
            Some(OutboundMessage::Send { text, keyboard, reply_to }) => {
                self.transport.send_message(chat_id, &text, keyboard.as_ref(), reply_to).await
            }
            Some(OutboundMessage::Edit { message_id, text, keyboard }) => {
                self.transport.edit_message(chat_id, message_id, &text, keyboard.as_ref()).await
            }
            None => Ok(()),
        }
    }
}
