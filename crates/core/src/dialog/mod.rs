pub mod engine;
pub mod events;
pub mod states;
pub mod store;

pub use engine::{CallbackAck, DialogEngine, DialogReply, OutboundMessage};
pub use events::{
    ButtonData, ButtonPressEvent, ChatId, Command, InboundEvent, MessageEvent, MessageId,
};
pub use states::{ConversationSession, DialogState, LineItem, ProductSelection, SaleDraft};
pub use store::SessionStore;
