use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::dialog::events::ChatId;
use crate::dialog::states::{ConversationSession, DialogState};

/// In-memory sessions keyed by chat. Each chat owns one lockable cell;
/// callers hold the cell lock for the whole transition, so overlapping
/// updates for the same chat apply one after the other.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Arc<Mutex<ConversationSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// First contact lazily creates an idle session.
    pub async fn get_or_create(&self, chat_id: ChatId) -> Arc<Mutex<ConversationSession>> {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(chat_id).or_default().clone()
    }

    pub async fn reset(&self, chat_id: ChatId) {
        let cell = self.get_or_create(chat_id).await;
        let mut session = cell.lock().await;
        session.reset();
    }

    pub async fn set_state(&self, chat_id: ChatId, state: DialogState) {
        let cell = self.get_or_create(chat_id).await;
        let mut session = cell.lock().await;
        session.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::states::LineItem;

    #[tokio::test]
    async fn same_chat_returns_same_cell() {
        let store = SessionStore::new();
        let first = store.get_or_create(ChatId(1)).await;
        let again = store.get_or_create(ChatId(1)).await;
        let other = store.get_or_create(ChatId(2)).await;

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn new_sessions_start_idle_and_empty() {
        let store = SessionStore::new();
        let cell = store.get_or_create(ChatId(5)).await;
        let session = cell.lock().await;

        assert_eq!(session.state, DialogState::Idle);
        assert!(session.draft.lines.is_empty());
        assert_eq!(session.draft.phone, None);
    }

    #[tokio::test]
    async fn reset_clears_state_and_draft_in_place() {
        let store = SessionStore::new();
        let cell = store.get_or_create(ChatId(9)).await;
        {
            let mut session = cell.lock().await;
            session.state = DialogState::Confirming;
            session.draft.phone = Some("3001234567".to_string());
            session.draft.add_line(LineItem {
                name: "Brownie".to_string(),
                variant: None,
                quantity: 2,
            });
        }

        store.reset(ChatId(9)).await;

        let session = cell.lock().await;
        assert_eq!(session.state, DialogState::Idle);
        assert_eq!(session.draft, Default::default());
    }

    #[tokio::test]
    async fn set_state_moves_the_machine() {
        let store = SessionStore::new();
        store.set_state(ChatId(3), DialogState::AwaitingPhone).await;

        let cell = store.get_or_create(ChatId(3)).await;
        assert_eq!(cell.lock().await.state, DialogState::AwaitingPhone);
    }

    #[tokio::test]
    async fn concurrent_updates_for_one_chat_serialize() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();

        for n in 0..8u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let cell = store.get_or_create(ChatId(42)).await;
                let mut session = cell.lock().await;
                let seen = session.draft.lines.len();
                tokio::task::yield_now().await;
                session.draft.add_line(LineItem {
                    name: format!("item-{n}"),
                    variant: None,
                    quantity: seen as u32 + 1,
                });
            }));
        }
        for handle in handles {
            handle.await.expect("task completes");
        }

        let cell = store.get_or_create(ChatId(42)).await;
        let session = cell.lock().await;
        assert_eq!(session.draft.lines.len(), 8);
    }
}
