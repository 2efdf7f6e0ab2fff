//! History Reader: read-only view of a caller's conversation

use std::sync::Arc;

use tokochat_auth::CallerIdentity;
use tokochat_common::{HistoryQuery, Result};

use crate::domain::entities::{validate_topic_ref, Message};
use crate::repository::ConversationStore;

#[derive(Clone)]
pub struct HistoryReader {
    store: Arc<dyn ConversationStore>,
    default_limit: i64,
    max_limit: i64,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn ConversationStore>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            store,
            default_limit,
            max_limit,
        }
    }

    /// Messages visible to `caller`, oldest first.
    ///
    /// Anonymous callers and owners that never chatted get an empty list.
    /// Never creates or changes anything.
    pub async fn read(
        &self,
        caller: Option<&CallerIdentity>,
        query: &HistoryQuery,
    ) -> Result<Vec<Message>> {
        let topic_ref = query.topic_ref();
        if let Some(topic) = topic_ref {
            validate_topic_ref(topic)?;
        }
        let limit = query.limit(self.default_limit, self.max_limit);

        let Some(caller) = caller else {
            return Ok(Vec::new());
        };

        let Some(owner) = self.store.find_owner(caller.subject.trim()).await? else {
            tracing::debug!(subject = %caller.subject, "No conversation owner yet");
            return Ok(Vec::new());
        };

        let messages = self
            .store
            .query_history(owner.id, topic_ref, limit)
            .await?;

        tracing::debug!(
            owner_id = %owner.id,
            topic_ref = ?topic_ref,
            limit,
            count = messages.len(),
            "History read"
        );

        Ok(messages)
    }
}
