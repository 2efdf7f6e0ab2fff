//! Tokochat Assistant Gateway
//!
//! Provides the conversational reasoning backend for storefront chat:
//! - HTTP client for the external reasoning service
//! - Simulated assistant for local development and tests
//! - Deterministic fallback reply used when the backend is unavailable

pub mod fallback;
pub mod http;
pub mod mock;

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use fallback::{fallback_reply, FALLBACK_REPLY, FALLBACK_SUGGESTIONS};

/// Default bound for a single gateway call
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// Maximum number of quick-reply suggestions passed on to clients
pub const MAX_SUGGESTIONS: usize = 5;

/// Maximum length of a single suggestion, in characters
pub const MAX_SUGGESTION_LENGTH: usize = 200;

/// Every way the reasoning backend can be unavailable.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Assistant configuration error: {0}")]
    Configuration(String),

    #[error("Assistant call timed out after {0} ms")]
    Timeout(u64),

    #[error("Assistant request error: {0}")]
    Request(String),

    #[error("Assistant returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Assistant response error: {0}")]
    Response(String),
}

/// Outbound request to the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub owner_id: Uuid,
    pub topic_ref: Option<String>,
    pub message: String,
    /// Free-form grounding data, e.g. the product being discussed
    pub context: Option<serde_json::Value>,
    pub session_id: String,
}

/// Reply from the reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AssistantReply {
    pub fn new(reply: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            reply: reply.into(),
            suggestions,
            metadata: None,
        }
    }

    /// A reply with no visible text cannot be persisted as a message
    pub fn is_blank(&self) -> bool {
        self.reply.trim().is_empty()
    }
}

/// Services send `"suggestions": null` when they have none
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trim, de-duplicate, and bound the suggestion list.
pub fn sanitize_suggestions(suggestions: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();

    for suggestion in suggestions {
        let trimmed = suggestion.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_SUGGESTION_LENGTH {
            continue;
        }
        if cleaned.iter().any(|s| s == trimmed) {
            continue;
        }
        cleaned.push(trimmed.to_string());
        if cleaned.len() == MAX_SUGGESTIONS {
            break;
        }
    }

    cleaned
}

/// Assistant gateway configuration.
#[derive(Clone)]
pub struct AssistantConfig {
    /// Gateway provider (http, mock)
    pub provider: String,
    /// Base URL of the external reasoning service
    pub base_url: Option<String>,
    /// Optional bearer key for the reasoning service
    pub api_key: Option<String>,
    /// Fixed bound for one gateway call
    pub timeout: Duration,
}

impl std::fmt::Debug for AssistantConfig {
    #[mutants::skip] // Redaction only
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            base_url: None,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl AssistantConfig {
    /// Create assistant config from environment variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("ASSISTANT_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let base_url = std::env::var("ASSISTANT_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let api_key = std::env::var("ASSISTANT_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let timeout_ms = std::env::var("ASSISTANT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        if provider == "http" && base_url.is_none() {
            return Err(GatewayError::Configuration(
                "ASSISTANT_BASE_URL is required for the http provider".to_string(),
            ));
        }

        Ok(Self {
            provider,
            base_url,
            api_key,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Contract for anything that can answer a customer message.
///
/// Implementations report every failure as a `GatewayError`; deciding what
/// the customer sees instead is the caller's job.
#[async_trait::async_trait]
pub trait AssistantGateway: Send + Sync {
    /// Ask the reasoning backend for a reply.
    async fn invoke(&self, request: AssistantRequest) -> Result<AssistantReply, GatewayError>;

    /// Short provider name for logs
    fn name(&self) -> &'static str;
}

/// Factory for creating AssistantGateway implementations.
pub struct AssistantGatewayFactory;

impl AssistantGatewayFactory {
    /// Create an AssistantGateway based on configuration.
    pub fn create(config: AssistantConfig) -> Result<Box<dyn AssistantGateway>, GatewayError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(
                    timeout_ms = config.timeout.as_millis() as u64,
                    "Creating HTTP assistant gateway"
                );
                Ok(Box::new(http::HttpAssistantGateway::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating simulated assistant gateway");
                Ok(Box::new(mock::MockAssistantGateway::new()))
            }
            provider => Err(GatewayError::Configuration(format!(
                "Unknown assistant provider: {}. Supported providers: http, mock",
                provider
            ))),
        }
    }
}
