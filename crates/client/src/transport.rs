//! Client side of the chat HTTP API
//!
//! `ChatTransport` is what a chat surface talks to; `HttpChatTransport`
//! is the implementation that goes over the network.

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong between a surface and the server
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Sign in to chat")]
    Unauthenticated,

    #[error("Invalid message: {0}")]
    InvalidInput(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Message author as sent by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Server-confirmed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub author_role: Role,
    pub owner_id: Uuid,
    pub topic_ref: Option<String>,
    pub body: String,
    pub sequence: i64,
    #[serde(default)]
    pub in_reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Body of a turn submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// Server reply to a turn submission
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Connection from a chat surface to the chat API
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Whether requests carry a caller identity
    fn has_identity(&self) -> bool;

    /// Previous messages, oldest first
    async fn fetch_history(
        &self,
        topic_ref: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, TransportError>;

    /// Submit one turn
    async fn submit_turn(&self, payload: &TurnPayload) -> Result<TurnResponse, TransportError>;
}

/// HTTP chat transport
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpChatTransport {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map a non-success response onto a transport error
    async fn error_from(response: Response) -> TransportError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);

        match status {
            StatusCode::UNAUTHORIZED => TransportError::Unauthenticated,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                TransportError::InvalidInput(message)
            }
            _ => TransportError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

fn network_error(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

fn decode_error(e: reqwest::Error) -> TransportError {
    TransportError::Decode(e.to_string())
}

#[async_trait::async_trait]
impl ChatTransport for HttpChatTransport {
    fn has_identity(&self) -> bool {
        self.token.is_some()
    }

    async fn fetch_history(
        &self,
        topic_ref: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, TransportError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(topic) = topic_ref {
            query.push(("topicRef", topic.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let url = format!("{}/v1/chat/history", self.base_url);
        let response = self
            .authorize(self.client.get(&url).query(&query))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: HistoryResponse = response.json().await.map_err(decode_error)?;
        Ok(body.messages)
    }

    async fn submit_turn(&self, payload: &TurnPayload) -> Result<TurnResponse, TransportError> {
        let url = format!("{}/v1/chat/turns", self.base_url);
        let response = self
            .authorize(self.client.post(&url).json(payload))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response.json().await.map_err(decode_error)
    }
}
