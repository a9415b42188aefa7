pub mod catalog;
pub mod config;
pub mod dialog;
pub mod keyboard;
pub mod sale;

pub use catalog::{CatalogEntry, CATALOG};
pub use dialog::engine::{CallbackAck, DialogEngine, DialogReply, OutboundMessage};
pub use dialog::events::{
    ButtonData, ButtonPressEvent, ChatId, Command, InboundEvent, MessageEvent, MessageId,
};
pub use dialog::states::{ConversationSession, DialogState, LineItem, ProductSelection, SaleDraft};
pub use dialog::store::SessionStore;
pub use keyboard::{Button, Keyboard};
pub use sale::{
    CommitError, CustomerDirectory, CustomerRef, LookupError, OrderReference, SaleLedger,
};
