//! Chat API handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokochat_auth::{AuthUser, MaybeAuthUser};
use tokochat_common::{Error, HistoryQuery, Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{AuthorRole, Message, TurnOutcome};
use crate::service::TurnRequest;

/// Request for submitting a turn
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTurnRequest {
    /// Message text typed by the customer
    #[validate(length(max = 4000))]
    pub message: String,
    /// Product or subject the conversation is about
    #[validate(length(min = 1, max = 200))]
    pub topic_ref: Option<String>,
    /// Grounding data for the assistant (e.g. the product on screen)
    pub context: Option<serde_json::Value>,
}

impl From<SubmitTurnRequest> for TurnRequest {
    fn from(req: SubmitTurnRequest) -> Self {
        Self {
            message: req.message,
            topic_ref: req.topic_ref,
            context: req.context,
        }
    }
}

/// Message response DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub author_role: AuthorRole,
    pub owner_id: Uuid,
    pub topic_ref: Option<String>,
    pub body: String,
    pub sequence: i64,
    pub in_reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            author_role: m.author_role,
            owner_id: m.owner_id,
            topic_ref: m.topic_ref,
            body: m.body,
            sequence: m.sequence,
            in_reply_to: m.in_reply_to,
            created_at: m.created_at,
        }
    }
}

/// Response for a completed turn
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTurnResponse {
    pub user_message: MessageResponse,
    pub assistant_message: MessageResponse,
    pub suggestions: Vec<String>,
    pub fallback: bool,
}

impl From<TurnOutcome> for SubmitTurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            user_message: outcome.user_message.into(),
            assistant_message: outcome.assistant_message.into(),
            suggestions: outcome.suggestions,
            fallback: outcome.fallback,
        }
    }
}

/// Response for a history fetch
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageResponse>,
}

/// Submit one user message and get the assistant's answer
pub async fn submit_turn(
    AuthUser(caller): AuthUser,
    State(state): State<ConversationsState>,
    ValidatedJson(req): ValidatedJson<SubmitTurnRequest>,
) -> Result<(StatusCode, Json<SubmitTurnResponse>)> {
    // A turn runs to completion even if the client hangs up mid-request
    let relay = state.relay.clone();
    let outcome = tokio::spawn(async move { relay.submit_turn(&caller, req.into()).await })
        .await
        .map_err(|e| Error::Internal(format!("Turn task failed: {}", e)))??;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// Fetch the caller's conversation history, oldest first
pub async fn fetch_history(
    MaybeAuthUser(caller): MaybeAuthUser,
    State(state): State<ConversationsState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let messages = state.history.read(caller.as_ref(), &query).await?;

    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}
