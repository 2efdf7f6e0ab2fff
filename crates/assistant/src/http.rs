//! External reasoning service client
//!
//! POSTs `{ownerId, topicRef, message, context, sessionId}` to
//! `{base_url}/v1/chat` and expects `{reply, suggestions?, metadata?}` back.
//! The whole call is bounded by the configured timeout.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{AssistantConfig, AssistantGateway, AssistantReply, AssistantRequest, GatewayError};

const CHAT_PATH: &str = "/v1/chat";

/// Error body some reasoning services return on failure
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// HTTP assistant gateway implementation
pub struct HttpAssistantGateway {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpAssistantGateway {
    /// Create a new HTTP gateway. Fails if no base URL is configured.
    pub fn new(config: AssistantConfig) -> Result<Self, GatewayError> {
        let base_url = config.base_url.ok_or_else(|| {
            GatewayError::Configuration("ASSISTANT_BASE_URL is required".to_string())
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHAT_PATH),
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout.as_millis() as u64)
        } else {
            GatewayError::Request(format!("HTTP request failed: {}", e))
        }
    }
}

#[async_trait::async_trait]
impl AssistantGateway for HttpAssistantGateway {
    async fn invoke(&self, request: AssistantRequest) -> Result<AssistantReply, GatewayError> {
        tracing::debug!(
            owner_id = %request.owner_id,
            session_id = %request.session_id,
            endpoint = %self.endpoint,
            "Sending assistant request"
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            let body = serde_json::from_str::<ErrorResponse>(&error_body)
                .map(|e| e.error.message)
                .unwrap_or(error_body);

            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: AssistantReply = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout.as_millis() as u64)
            } else {
                GatewayError::Response(format!("Failed to parse response: {}", e))
            }
        })?;

        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
