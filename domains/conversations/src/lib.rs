//! Conversations domain: message store, turn relay, history reader

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{AuthorRole, Message, NewMessage, Owner, TurnOutcome};

// Re-export repository types
pub use repository::{ConversationStore, InMemoryConversationStore, PgConversationStore};

// Re-export service types
pub use service::{HistoryReader, MessageRelay, TurnRequest};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
