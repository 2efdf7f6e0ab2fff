//! Conversation Store
//!
//! Durable, append-only record of messages keyed by owner and optional
//! topic. Two implementations share one contract:
//! - `PgConversationStore`: Postgres, used whenever a database is configured
//! - `InMemoryConversationStore`: process-local, for local runs and tests

pub mod memory;
pub mod postgres;

use tokochat_common::RepositoryError;
use uuid::Uuid;

use crate::domain::entities::{Message, NewMessage, Owner};

pub use memory::InMemoryConversationStore;
pub use postgres::PgConversationStore;

/// Persistence boundary for conversations. No business logic lives here.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Resolve the owner for `external_id`, creating it on first sight.
    /// Idempotent; a newer non-empty email replaces the stored one.
    async fn upsert_owner(
        &self,
        external_id: &str,
        email: Option<&str>,
    ) -> Result<Owner, RepositoryError>;

    /// Look up an owner without creating one
    async fn find_owner(&self, external_id: &str) -> Result<Option<Owner>, RepositoryError>;

    /// Store a message. Assigns id, sequence, and a `created_at` that is never
    /// earlier than the latest message of the same conversation.
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// The most recent `limit` messages of an owner, oldest first.
    ///
    /// `topic_ref = None` spans every topic of the owner. User messages whose
    /// turn has not completed (no reply stored yet) are left out.
    async fn query_history(
        &self,
        owner_id: Uuid,
        topic_ref: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Message>, RepositoryError>;
}
