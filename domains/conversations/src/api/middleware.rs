//! Conversations domain state and auth backend integration

use axum::extract::FromRef;
use tokochat_auth::AuthBackend;

use crate::service::{HistoryReader, MessageRelay};

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub relay: MessageRelay,
    pub history: HistoryReader,
    pub auth: AuthBackend,
}

impl FromRef<ConversationsState> for AuthBackend {
    fn from_ref(state: &ConversationsState) -> Self {
        state.auth.clone()
    }
}
