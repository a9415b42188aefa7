use tracing::{debug, error, info, warn};

use crate::catalog::{self, display_name};
use crate::dialog::events::{
    ButtonData, ButtonPressEvent, Command, InboundEvent, MessageEvent, MessageId,
};
use crate::dialog::states::{ConversationSession, DialogState, LineItem, ProductSelection, SaleDraft};
use crate::keyboard::Keyboard;
use crate::sale::{CustomerDirectory, SaleLedger};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackAck {
    pub callback_id: String,
    pub toast: Option<String>,
    pub show_alert: bool,
}

impl CallbackAck {
    pub fn plain(callback_id: &str) -> Self {
        Self {
            callback_id: callback_id.to_string(),
            toast: None,
            show_alert: false,
        }
    }

    pub fn with_toast(callback_id: &str, toast: impl Into<String>) -> Self {
        Self {
            callback_id: callback_id.to_string(),
            toast: Some(toast.into()),
            show_alert: false,
        }
    }

    pub fn with_alert(callback_id: &str, toast: impl Into<String>) -> Self {
        Self {
            callback_id: callback_id.to_string(),
            toast: Some(toast.into()),
            show_alert: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    Send {
        text: String,
        keyboard: Option<Keyboard>,
        reply_to: Option<MessageId>,
    },
    Edit {
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
}

/// What one inbound event turns into: an optional callback acknowledgment
/// (button presses always carry one) and at most one visible message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogReply {
    pub ack: Option<CallbackAck>,
    pub message: Option<OutboundMessage>,
}

pub struct DialogEngine<D, L> {
    directory: D,
    ledger: L,
}

impl<D, L> DialogEngine<D, L>
where
    D: CustomerDirectory,
    L: SaleLedger,
{
    pub fn new(directory: D, ledger: L) -> Self {
        Self { directory, ledger }
    }

    /// Advances one chat's conversation by one event. The caller holds the
    /// session lock for the duration, so the read-decide-write here is
    /// atomic per chat. Failures never escape: they are logged and turned
    /// into a reply the seller can act on.
    pub async fn handle(
        &self,
        session: &mut ConversationSession,
        event: &InboundEvent,
    ) -> DialogReply {
        match event {
            InboundEvent::Message(message) => self.handle_message(session, message).await,
            InboundEvent::ButtonPress(press) => self.handle_button(session, press).await,
        }
    }

    async fn handle_message(
        &self,
        session: &mut ConversationSession,
        message: &MessageEvent,
    ) -> DialogReply {
        if let Some(command) = Command::parse(&message.text) {
            return handle_command(session, command, message);
        }

        match session.state {
            DialogState::AwaitingPhone => self.capture_phone(session, message).await,
            DialogState::AwaitingName => capture_name(session, message),
            DialogState::AwaitingTotal => capture_total(session, message),
            _ => send_reply(
                "Usa /venta para registrar una nueva venta.",
                None,
                message.message_id,
            ),
        }
    }

    async fn capture_phone(
        &self,
        session: &mut ConversationSession,
        message: &MessageEvent,
    ) -> DialogReply {
        let digits: String = message.text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 7 {
            return send_reply(
                "⚠️ Teléfono inválido. Ingresa al menos 7 dígitos:",
                None,
                message.message_id,
            );
        }

        session.draft.phone = Some(digits.clone());
        match self.directory.find_by_phone(&digits).await {
            Ok(Some(customer)) => {
                session.draft.customer_id = Some(customer.id);
                session.draft.customer_name = Some(customer.name.clone());
                session.draft.new_customer = false;
                session.state = DialogState::SelectingProducts;
                send_reply(
                    format!(
                        "✅ <b>Cliente encontrado:</b> {}\n\n🛒 Selecciona los productos:",
                        customer.name
                    ),
                    Some(catalog::product_menu()),
                    message.message_id,
                )
            }
            Ok(None) => {
                session.draft.new_customer = true;
                session.state = DialogState::AwaitingName;
                send_reply(
                    "👤 <b>Cliente nuevo</b>\n\nIngresa el nombre del cliente:",
                    None,
                    message.message_id,
                )
            }
            Err(lookup_error) => {
                warn!(chat_id = %message.chat_id, error = %lookup_error, "customer lookup failed");
                send_reply(
                    "⚠️ No pude verificar el cliente. Intenta de nuevo:",
                    None,
                    message.message_id,
                )
            }
        }
    }

    async fn handle_button(
        &self,
        session: &mut ConversationSession,
        press: &ButtonPressEvent,
    ) -> DialogReply {
        match (&press.data, session.state) {
            (ButtonData::Product { button_id }, DialogState::SelectingProducts) => {
                select_product(session, press, button_id)
            }
            (ButtonData::FinishOrder, DialogState::SelectingProducts) => {
                finish_selection(session, press)
            }
            (ButtonData::Quantity(quantity), DialogState::SelectingQuantity) => {
                pick_quantity(session, press, *quantity)
            }
            (ButtonData::QuantityCancel, DialogState::SelectingQuantity) => {
                cancel_quantity(session, press)
            }
            (ButtonData::ConfirmYes, DialogState::Confirming) => {
                self.commit_sale(session, press).await
            }
            (ButtonData::ConfirmNo, DialogState::Confirming) => cancel_sale(session, press),
            _ => {
                debug!(
                    chat_id = %press.chat_id,
                    data = ?press.data,
                    state = ?session.state,
                    "button outside its state, acknowledging only"
                );
                ack_reply(CallbackAck::plain(&press.callback_id))
            }
        }
    }

    async fn commit_sale(
        &self,
        session: &mut ConversationSession,
        press: &ButtonPressEvent,
    ) -> DialogReply {
        let outcome = self.ledger.commit(&session.draft).await;
        session.reset();

        let text = match outcome {
            Ok(reference) => {
                info!(chat_id = %press.chat_id, order_id = %reference.order_id, "sale recorded");
                format!(
                    "✅ Venta registrada correctamente (Orden #{})",
                    reference.short()
                )
            }
            Err(commit_error) => {
                error!(chat_id = %press.chat_id, error = %commit_error, "sale commit failed");
                "❌ Error al guardar la venta. Intenta de nuevo con /venta.".to_string()
            }
        };

        edit_reply(CallbackAck::plain(&press.callback_id), press.message_id, text, None)
    }
}

fn handle_command(
    session: &mut ConversationSession,
    command: Command,
    message: &MessageEvent,
) -> DialogReply {
    match command {
        Command::Start => {
            session.reset();
            send_reply(
                "🛒 <b>¡Bienvenido a Vendebot!</b>\n\n\
                 Soy tu asistente para registrar ventas.\n\n\
                 Usa /venta para iniciar un nuevo registro.",
                None,
                message.message_id,
            )
        }
        Command::Venta => {
            session.reset();
            session.state = DialogState::AwaitingPhone;
            send_reply(
                "📱 <b>Nueva venta</b>\n\nIngresa el teléfono del cliente:",
                None,
                message.message_id,
            )
        }
        Command::Cancelar => {
            session.reset();
            send_reply("❌ Operación cancelada.", None, message.message_id)
        }
        Command::Id => send_reply(
            format!("🆔 Tu ID de Telegram es: <code>{}</code>", message.chat_id),
            None,
            message.message_id,
        ),
        Command::Ayuda => send_reply(
            "📖 <b>Cómo registrar una venta:</b>\n\n\
             1. Usa /venta para iniciar\n\
             2. Ingresa el teléfono del cliente\n\
             3. Si es nuevo, ingresa su nombre\n\
             4. Selecciona productos con los botones\n\
             5. Ingresa el total\n\
             6. Confirma la venta\n\n\
             <b>Otros comandos:</b>\n\
             • /cancelar - Cancela la operación actual\n\
             • /id - Muestra tu ID de Telegram",
            None,
            message.message_id,
        ),
    }
}

fn capture_name(session: &mut ConversationSession, message: &MessageEvent) -> DialogReply {
    let name = message.text.as_str();
    if name.chars().count() < 2 {
        return send_reply(
            "⚠️ Nombre muy corto. Ingresa el nombre completo:",
            None,
            message.message_id,
        );
    }

    session.draft.customer_name = Some(name.to_string());
    session.state = DialogState::SelectingProducts;
    send_reply(
        format!("👤 Cliente: <b>{name}</b>\n\n🛒 Selecciona los productos:"),
        Some(catalog::product_menu()),
        message.message_id,
    )
}

fn capture_total(session: &mut ConversationSession, message: &MessageEvent) -> DialogReply {
    let Some(total) = parse_total(&message.text) else {
        return send_reply(
            "⚠️ Total inválido. Ingresa solo el número (ej: 66000):",
            None,
            message.message_id,
        );
    };

    session.draft.total = Some(total);
    session.state = DialogState::Confirming;
    send_reply(
        sale_summary(&session.draft),
        Some(catalog::confirm_menu()),
        message.message_id,
    )
}

fn select_product(
    session: &mut ConversationSession,
    press: &ButtonPressEvent,
    button_id: &str,
) -> DialogReply {
    let Some(entry) = catalog::find_by_button_id(button_id) else {
        debug!(chat_id = %press.chat_id, button_id, "unknown product payload");
        return ack_reply(CallbackAck::plain(&press.callback_id));
    };

    session.draft.pending = Some(ProductSelection {
        name: entry.name.to_string(),
        variant: entry.variant.map(str::to_string),
    });
    session.state = DialogState::SelectingQuantity;
    edit_reply(
        CallbackAck::plain(&press.callback_id),
        press.message_id,
        format!("📦 <b>{}</b>\n\n¿Cuántas cajas?", entry.display_name()),
        Some(catalog::quantity_menu()),
    )
}

fn finish_selection(session: &mut ConversationSession, press: &ButtonPressEvent) -> DialogReply {
    if session.draft.lines.is_empty() {
        return ack_reply(CallbackAck::with_alert(
            &press.callback_id,
            "⚠️ Agrega al menos un producto",
        ));
    }

    session.state = DialogState::AwaitingTotal;
    edit_reply(
        CallbackAck::plain(&press.callback_id),
        press.message_id,
        format!(
            "{}\n\n💰 <b>Ingresa el total de la venta:</b>",
            cart_recap(&session.draft)
        ),
        None,
    )
}

fn pick_quantity(
    session: &mut ConversationSession,
    press: &ButtonPressEvent,
    quantity: u32,
) -> DialogReply {
    let Some(pending) = session.draft.pending.take() else {
        warn!(chat_id = %press.chat_id, "quantity pressed with no pending product");
        session.state = DialogState::SelectingProducts;
        return ack_reply(CallbackAck::plain(&press.callback_id));
    };

    let shown = display_name(&pending.name, pending.variant.as_deref());
    session.draft.add_line(LineItem {
        name: pending.name,
        variant: pending.variant,
        quantity,
    });
    session.state = DialogState::SelectingProducts;
    edit_reply(
        CallbackAck::with_toast(&press.callback_id, format!("✅ {quantity}x {shown}")),
        press.message_id,
        format!(
            "{}\n\n🛒 Selecciona más productos o finaliza:",
            cart_recap(&session.draft)
        ),
        Some(catalog::product_menu()),
    )
}

fn cancel_quantity(session: &mut ConversationSession, press: &ButtonPressEvent) -> DialogReply {
    session.draft.pending = None;
    session.state = DialogState::SelectingProducts;
    edit_reply(
        CallbackAck::plain(&press.callback_id),
        press.message_id,
        format!("{}\n\n🛒 Selecciona productos:", cart_recap(&session.draft)),
        Some(catalog::product_menu()),
    )
}

fn cancel_sale(session: &mut ConversationSession, press: &ButtonPressEvent) -> DialogReply {
    session.reset();
    edit_reply(
        CallbackAck::plain(&press.callback_id),
        press.message_id,
        "❌ Venta cancelada.".to_string(),
        None,
    )
}

fn parse_total(text: &str) -> Option<i64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | '.' | ',' | ' '))
        .collect();
    match cleaned.parse::<i64>() {
        Ok(total) if total > 0 => Some(total),
        _ => None,
    }
}

fn cart_recap(draft: &SaleDraft) -> String {
    if draft.lines.is_empty() {
        return "🛒 <b>Carrito vacío</b>".to_string();
    }

    let mut lines = vec!["🛒 <b>Productos:</b>".to_string()];
    for item in &draft.lines {
        lines.push(format!(
            "  • {}x {}",
            item.quantity,
            display_name(&item.name, item.variant.as_deref())
        ));
    }
    lines.join("\n")
}

fn sale_summary(draft: &SaleDraft) -> String {
    let mut customer = format!(
        "👤 <b>Cliente:</b> {}",
        draft.customer_name.as_deref().unwrap_or("")
    );
    if draft.new_customer {
        customer.push_str(" (nuevo)");
    }
    customer.push_str(&format!(
        "\n📱 <b>Tel:</b> {}",
        draft.phone.as_deref().unwrap_or("")
    ));

    format!(
        "📦 <b>Confirmar venta:</b>\n\n{customer}\n\n{}\n\n💰 <b>Total:</b> ${} COP",
        cart_recap(draft),
        format_thousands(draft.total.unwrap_or(0))
    )
}

/// Comma-grouped rendering for COP amounts, e.g. `45000` becomes `45,000`.
fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn send_reply(
    text: impl Into<String>,
    keyboard: Option<Keyboard>,
    reply_to: MessageId,
) -> DialogReply {
    DialogReply {
        ack: None,
        message: Some(OutboundMessage::Send {
            text: text.into(),
            keyboard,
            reply_to: Some(reply_to),
        }),
    }
}

fn edit_reply(
    ack: CallbackAck,
    message_id: MessageId,
    text: String,
    keyboard: Option<Keyboard>,
) -> DialogReply {
    DialogReply {
        ack: Some(ack),
        message: Some(OutboundMessage::Edit {
            message_id,
            text,
            keyboard,
        }),
    }
}

fn ack_reply(ack: CallbackAck) -> DialogReply {
    DialogReply {
        ack: Some(ack),
        message: None,
    }
}
