//! Postgres conversation store

use sqlx::PgPool;
use tokochat_common::RepositoryError;
use uuid::Uuid;

use super::ConversationStore;
use crate::domain::entities::{Message, NewMessage, Owner};

#[derive(Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    #[mutants::skip] // Needs a live database
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Unavailable(format!("Migration failed: {}", e)))
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ConversationStore for PgConversationStore {
    async fn upsert_owner(
        &self,
        external_id: &str,
        email: Option<&str>,
    ) -> Result<Owner, RepositoryError> {
        let owner = sqlx::query_as::<_, Owner>(
            r#"
            INSERT INTO owners (id, external_id, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (external_id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, owners.email),
                updated_at = NOW()
            RETURNING id, external_id, email, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(external_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn find_owner(&self, external_id: &str) -> Result<Option<Owner>, RepositoryError> {
        let owner = sqlx::query_as::<_, Owner>(
            r#"
            SELECT id, external_id, email, created_at, updated_at
            FROM owners
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        // GREATEST skips NULL, so the first message of a conversation gets NOW().
        // The MAX(created_at) read takes no lock, so two concurrent appends can
        // share a timestamp. `sequence` is the ordering authority; history
        // never sorts by created_at.
        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, owner_id, topic_ref, author_role, body, in_reply_to, created_at)
            VALUES (
                $1, $2, $3, $4, $5, $6,
                GREATEST(
                    NOW(),
                    (SELECT MAX(created_at) FROM messages
                     WHERE owner_id = $2 AND topic_ref IS NOT DISTINCT FROM $3)
                )
            )
            RETURNING id, sequence, owner_id, topic_ref, author_role, body,
                      in_reply_to, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.owner_id)
        .bind(&message.topic_ref)
        .bind(message.author_role)
        .bind(&message.body)
        .bind(message.in_reply_to)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn query_history(
        &self,
        owner_id: Uuid,
        topic_ref: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sequence, owner_id, topic_ref, author_role, body,
                   in_reply_to, created_at
            FROM (
                SELECT m.id, m.sequence, m.owner_id, m.topic_ref, m.author_role,
                       m.body, m.in_reply_to, m.created_at
                FROM messages m
                WHERE m.owner_id = $1
                  AND ($2::text IS NULL OR m.topic_ref = $2)
                  AND (
                      m.author_role <> 'user'
                      OR EXISTS (SELECT 1 FROM messages r WHERE r.in_reply_to = m.id)
                  )
                ORDER BY m.sequence DESC
                LIMIT $3
            ) recent
            ORDER BY sequence ASC
            "#,
        )
        .bind(owner_id)
        .bind(topic_ref)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
