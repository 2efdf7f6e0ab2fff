//! In-memory conversation store
//!
//! Keeps everything behind one mutex, so appends are totally ordered just
//! like a sequence column would order them. Clones share the same data.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokochat_common::RepositoryError;
use uuid::Uuid;

use super::ConversationStore;
use crate::domain::entities::{AuthorRole, Message, NewMessage, Owner};

#[derive(Debug, Default)]
struct Inner {
    /// Owners keyed by external id
    owners: HashMap<String, Owner>,
    /// Messages in append order
    messages: Vec<Message>,
    last_sequence: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the backing store were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every stored message, including ones hidden from history
    pub fn all_messages(&self) -> Vec<Message> {
        match self.inner.lock() {
            Ok(inner) => inner.messages.clone(),
            Err(poisoned) => poisoned.into_inner().messages.clone(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        self.inner
            .lock()
            .map_err(|e| RepositoryError::Poisoned(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn upsert_owner(
        &self,
        external_id: &str,
        email: Option<&str>,
    ) -> Result<Owner, RepositoryError> {
        let mut inner = self.lock()?;

        let owner = inner
            .owners
            .entry(external_id.to_string())
            .and_modify(|owner| {
                if let Some(email) = email {
                    owner.email = Some(email.to_string());
                    owner.updated_at = Utc::now();
                }
            })
            .or_insert_with(|| Owner::new(external_id, email.map(str::to_string)));

        Ok(owner.clone())
    }

    async fn find_owner(&self, external_id: &str) -> Result<Option<Owner>, RepositoryError> {
        let inner = self.lock()?;
        Ok(inner.owners.get(external_id).cloned())
    }

    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut inner = self.lock()?;

        let latest = inner
            .messages
            .iter()
            .filter(|m| m.owner_id == message.owner_id && m.topic_ref == message.topic_ref)
            .map(|m| m.created_at)
            .max();
        let now = Utc::now();
        let created_at = latest.map_or(now, |latest| latest.max(now));

        inner.last_sequence += 1;
        let stored = Message {
            id: Uuid::new_v4(),
            sequence: inner.last_sequence,
            owner_id: message.owner_id,
            topic_ref: message.topic_ref,
            author_role: message.author_role,
            body: message.body,
            in_reply_to: message.in_reply_to,
            created_at,
        };
        inner.messages.push(stored.clone());

        Ok(stored)
    }

    async fn query_history(
        &self,
        owner_id: Uuid,
        topic_ref: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let inner = self.lock()?;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        let replied_to: HashSet<Uuid> = inner
            .messages
            .iter()
            .filter(|m| m.owner_id == owner_id)
            .filter_map(|m| m.in_reply_to)
            .collect();
        let answered =
            |m: &Message| m.author_role != AuthorRole::User || replied_to.contains(&m.id);

        let mut recent: Vec<Message> = inner
            .messages
            .iter()
            .rev()
            .filter(|m| m.owner_id == owner_id)
            .filter(|m| topic_ref.is_none() || m.topic_ref.as_deref() == topic_ref)
            .filter(|m| answered(m))
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();

        Ok(recent)
    }
}
