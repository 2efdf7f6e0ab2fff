//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::chat;
use super::middleware::ConversationsState;

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/chat/turns", post(chat::submit_turn))
        .route("/v1/chat/history", get(chat::fetch_history))
}
