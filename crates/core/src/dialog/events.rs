use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Venta,
    Cancelar,
    Id,
    Ayuda,
}

impl Command {
    /// Exact match against the trimmed message text. Anything that is not a
    /// bare command falls through to the state machine as free text.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/start" => Some(Self::Start),
            "/venta" => Some(Self::Venta),
            "/cancelar" => Some(Self::Cancelar),
            "/id" => Some(Self::Id),
            "/ayuda" | "/help" => Some(Self::Ayuda),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonData {
    Product { button_id: String },
    FinishOrder,
    Quantity(u32),
    QuantityCancel,
    ConfirmYes,
    ConfirmNo,
    Unrecognized,
}

impl ButtonData {
    pub fn parse(data: &str) -> Self {
        if data == "prod_finalizar" {
            return Self::FinishOrder;
        }
        if let Some(button_id) = data.strip_prefix("prod_") {
            return Self::Product {
                button_id: button_id.to_string(),
            };
        }
        if data == "cant_cancelar" {
            return Self::QuantityCancel;
        }
        if let Some(raw) = data.strip_prefix("cant_") {
            if let Ok(quantity) = raw.parse::<u32>() {
                if (1..=10).contains(&quantity) {
                    return Self::Quantity(quantity);
                }
            }
            return Self::Unrecognized;
        }
        match data {
            "confirm_si" => Self::ConfirmYes,
            "confirm_no" => Self::ConfirmNo,
            _ => Self::Unrecognized,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender_name: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonPressEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub callback_id: String,
    pub data: ButtonData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Message(MessageEvent),
    ButtonPress(ButtonPressEvent),
}

impl InboundEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::Message(event) => event.chat_id,
            Self::ButtonPress(event) => event.chat_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::ButtonPress(_) => "button_press",
        }
    }
}
