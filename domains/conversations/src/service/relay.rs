//! Message Relay Service
//!
//! Runs one conversational turn: validate, persist the user message, ask the
//! assistant, persist the reply, hand both back. Assistant failures end in
//! the fallback reply; only invalid input, a missing identity, or a broken
//! store reach the caller as errors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokochat_assistant::{
    fallback_reply, sanitize_suggestions, AssistantGateway, AssistantReply, AssistantRequest,
    GatewayError,
};
use tokochat_auth::CallerIdentity;
use tokochat_common::{Error, Result};

use crate::domain::entities::{
    session_id, truncate_chars, validate_body, validate_context, validate_topic_ref, Message,
    NewMessage, TurnOutcome, MAX_BODY_LENGTH,
};
use crate::repository::ConversationStore;

/// One submitted user message
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub message: String,
    pub topic_ref: Option<String>,
    /// Grounding data forwarded to the assistant, never persisted
    pub context: Option<serde_json::Value>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            topic_ref: None,
            context: None,
        }
    }

    pub fn with_topic(mut self, topic_ref: impl Into<String>) -> Self {
        self.topic_ref = Some(topic_ref.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Reject the request before anything is written
    fn validate(&self) -> Result<()> {
        validate_body(&self.message)?;
        if let Some(ref topic) = self.topic_ref {
            validate_topic_ref(topic)?;
        }
        if let Some(ref context) = self.context {
            validate_context(context)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MessageRelay {
    store: Arc<dyn ConversationStore>,
    gateway: Arc<dyn AssistantGateway>,
    gateway_timeout: Duration,
}

impl MessageRelay {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        gateway: Arc<dyn AssistantGateway>,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            gateway_timeout,
        }
    }

    /// Run one turn for `caller`.
    ///
    /// No lock is held across turns: two concurrent turns for the same
    /// owner and topic are ordered only by the store's append order.
    pub async fn submit_turn(
        &self,
        caller: &CallerIdentity,
        request: TurnRequest,
    ) -> Result<TurnOutcome> {
        let subject = caller.subject.trim();
        if subject.is_empty() {
            return Err(Error::Unauthenticated(
                "No resolvable conversation owner".to_string(),
            ));
        }
        request.validate()?;

        let owner = self
            .store
            .upsert_owner(subject, caller.email.as_deref())
            .await?;

        let user_message = self
            .store
            .append(NewMessage::user(
                owner.id,
                request.topic_ref,
                request.message,
            )?)
            .await?;

        let (reply, fallback) = self.ask_assistant(&user_message, request.context).await;

        let body = truncate_chars(reply.reply.trim(), MAX_BODY_LENGTH).to_string();
        let assistant_message = self
            .store
            .append(NewMessage::assistant_reply(&user_message, body)?)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    owner_id = %owner.id,
                    user_message_id = %user_message.id,
                    error = %e,
                    "Failed to store assistant reply, turn left incomplete"
                );
            })?;

        tracing::info!(
            owner_id = %owner.id,
            topic_ref = ?user_message.topic_ref,
            fallback,
            "Turn completed"
        );

        Ok(TurnOutcome {
            user_message,
            assistant_message,
            suggestions: reply.suggestions,
            fallback,
        })
    }

    /// Ask the gateway under the turn timeout. Returns the reply to store and
    /// whether it is the fallback.
    async fn ask_assistant(
        &self,
        question: &Message,
        context: Option<serde_json::Value>,
    ) -> (AssistantReply, bool) {
        let request = AssistantRequest {
            owner_id: question.owner_id,
            topic_ref: question.topic_ref.clone(),
            message: question.body.clone(),
            context,
            session_id: session_id(question.owner_id, question.topic_ref.as_deref()),
        };

        let started = Instant::now();
        let result =
            match tokio::time::timeout(self.gateway_timeout, self.gateway.invoke(request)).await {
                Ok(Ok(reply)) if reply.is_blank() => Err(GatewayError::Response(
                    "Assistant returned a blank reply".to_string(),
                )),
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(
                    self.gateway_timeout.as_millis() as u64
                )),
            };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(reply) => {
                tracing::debug!(
                    gateway = self.gateway.name(),
                    elapsed_ms,
                    "Assistant replied"
                );
                let suggestions = sanitize_suggestions(reply.suggestions);
                (
                    AssistantReply {
                        suggestions,
                        ..reply
                    },
                    false,
                )
            }
            Err(e) => {
                tracing::warn!(
                    gateway = self.gateway.name(),
                    owner_id = %question.owner_id,
                    elapsed_ms,
                    error = %e,
                    "Assistant unavailable, using fallback reply"
                );
                (fallback_reply(), true)
            }
        }
    }
}
