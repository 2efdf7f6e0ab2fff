//! Domain entities for the Conversations domain
//!
//! Messages are immutable once the store has accepted them. `NewMessage`
//! carries everything the caller decides; the store assigns the rest
//! (id, sequence, timestamp).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tokochat_common::{Error, Result};

/// Maximum message body length, in characters
pub const MAX_BODY_LENGTH: usize = 4000;

/// Maximum topic reference length, in characters
pub const MAX_TOPIC_REF_LENGTH: usize = 200;

/// Maximum serialized size of the grounding context, in bytes
pub const MAX_CONTEXT_BYTES: usize = 16 * 1024;

/// Key used for conversations without a topic
pub const GENERAL_TOPIC: &str = "general";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "author_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    User,
    Assistant,
    /// Reserved for non-chat notices
    System,
}

impl std::fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorRole::User => write!(f, "user"),
            AuthorRole::Assistant => write!(f, "assistant"),
            AuthorRole::System => write!(f, "system"),
        }
    }
}

/// The human participant of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Owner {
    pub id: Uuid,
    /// Stable identifier from the identity token (`sub`)
    pub external_id: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owner {
    pub fn new(external_id: impl Into<String>, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            email,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sequence: i64,
    pub owner_id: Uuid,
    pub topic_ref: Option<String>,
    pub author_role: AuthorRole,
    pub body: String,
    /// The user message this one answers; set on assistant replies
    pub in_reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A message that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub owner_id: Uuid,
    pub topic_ref: Option<String>,
    pub author_role: AuthorRole,
    pub body: String,
    pub in_reply_to: Option<Uuid>,
}

impl NewMessage {
    /// Create a new user message
    pub fn user(owner_id: Uuid, topic_ref: Option<String>, body: String) -> Result<Self> {
        validate_body(&body)?;
        if let Some(ref topic) = topic_ref {
            validate_topic_ref(topic)?;
        }

        Ok(Self {
            owner_id,
            topic_ref,
            author_role: AuthorRole::User,
            body,
            in_reply_to: None,
        })
    }

    /// Create the assistant message answering `question`
    pub fn assistant_reply(question: &Message, body: String) -> Result<Self> {
        validate_body(&body)?;

        Ok(Self {
            owner_id: question.owner_id,
            topic_ref: question.topic_ref.clone(),
            author_role: AuthorRole::Assistant,
            body,
            in_reply_to: Some(question.id),
        })
    }
}

/// Both persisted halves of a completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub user_message: Message,
    pub assistant_message: Message,
    pub suggestions: Vec<String>,
    /// The assistant message is the fallback reply
    pub fallback: bool,
}

/// Conversation key handed to the reasoning service as its session id
pub fn session_id(owner_id: Uuid, topic_ref: Option<&str>) -> String {
    format!("{}:{}", owner_id, topic_ref.unwrap_or(GENERAL_TOPIC))
}

/// Message body must be non-blank and bounded (CHECK (length(trim(body)) > 0))
pub fn validate_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Message cannot be empty or whitespace-only".to_string(),
        ));
    }
    if body.chars().count() > MAX_BODY_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Message must be at most {} characters",
            MAX_BODY_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_topic_ref(topic_ref: &str) -> Result<()> {
    if topic_ref.is_empty() || topic_ref.chars().count() > MAX_TOPIC_REF_LENGTH {
        return Err(Error::InvalidInput(format!(
            "topicRef must be between 1 and {} characters",
            MAX_TOPIC_REF_LENGTH
        )));
    }
    if topic_ref.trim() != topic_ref {
        return Err(Error::InvalidInput(
            "topicRef cannot have leading or trailing whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Grounding context must be a JSON object of bounded size
pub fn validate_context(context: &serde_json::Value) -> Result<()> {
    if !context.is_object() {
        return Err(Error::InvalidInput(
            "context must be a JSON object".to_string(),
        ));
    }
    let size = serde_json::to_vec(context)?.len();
    if size > MAX_CONTEXT_BYTES {
        return Err(Error::InvalidInput(format!(
            "context must be at most {} bytes",
            MAX_CONTEXT_BYTES
        )));
    }
    Ok(())
}

/// Cut `text` to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
