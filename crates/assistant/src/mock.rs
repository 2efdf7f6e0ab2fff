//! Simulated Assistant Gateway
//!
//! Programmable stand-in for the reasoning service:
//! - `MockAssistantGateway`: canned storefront answers, with opt-in request recording
//! - `MockBehavior`: Simulated, Scripted, or Unavailable, plus an optional delay

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::{AssistantGateway, AssistantReply, AssistantRequest, GatewayError};

/// Canned replies used by the simulated assistant
const SIMULATED_REPLIES: [&str; 5] = [
    "Thanks for your question! This product is available and ready to ship.",
    "This item is in stock. Add it to your cart and complete checkout to order.",
    "We accept bank transfer, e-wallets, and cash on delivery for most areas.",
    "Orders are usually shipped within 1-2 business days after payment is confirmed.",
    "Happy to help! Let me know if you want details about sizes, colors, or shipping.",
];

/// Follow-up questions the simulated assistant picks from
const SIMULATED_SUGGESTIONS: [&str; 6] = [
    "Is this item in stock?",
    "How long does shipping take?",
    "What payment methods are accepted?",
    "Can I return this item?",
    "Are there other colors available?",
    "How do I track my order?",
];

/// What the mock should do on the next invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MockBehavior {
    /// Random canned reply with two random suggestions
    #[default]
    Simulated,
    /// Always return this reply
    Scripted(AssistantReply),
    /// Fail every call as if the service were down
    Unavailable,
}

/// Simulated assistant with programmable behavior
#[derive(Debug, Clone, Default)]
pub struct MockAssistantGateway {
    behavior: Arc<RwLock<MockBehavior>>,
    delay: Arc<RwLock<Option<Duration>>>,
    history: Arc<Mutex<Vec<AssistantRequest>>>,
    recording: bool,
}

impl MockAssistantGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that always answers with `reply`
    pub fn scripted(reply: AssistantReply) -> Self {
        let mock = Self::new();
        mock.set_behavior(MockBehavior::Scripted(reply));
        mock
    }

    /// Mock that fails every call
    pub fn unavailable() -> Self {
        let mock = Self::new();
        mock.set_behavior(MockBehavior::Unavailable);
        mock
    }

    /// Keep every request for `recorded_requests`. Off by default, the log
    /// is unbounded.
    pub fn recording(mut self) -> Self {
        self.recording = true;
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.write().unwrap_or_else(|e| e.into_inner()) = behavior;
    }

    /// Sleep this long before answering
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    pub fn behavior(&self) -> MockBehavior {
        self.behavior
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests received so far, oldest first. Empty unless built with
    /// `recording()`.
    pub fn recorded_requests(&self) -> Vec<AssistantRequest> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Restore simulated behavior and clear recorded requests
    pub fn reset(&self) {
        self.set_behavior(MockBehavior::Simulated);
        self.set_delay(None);
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn simulated_reply() -> AssistantReply {
        let mut rng = rand::thread_rng();

        let reply = SIMULATED_REPLIES
            .choose(&mut rng)
            .copied()
            .unwrap_or(SIMULATED_REPLIES[0]);

        let suggestions = SIMULATED_SUGGESTIONS
            .choose_multiple(&mut rng, 2)
            .map(|s| s.to_string())
            .collect();

        AssistantReply::new(reply, suggestions)
    }
}

#[async_trait::async_trait]
impl AssistantGateway for MockAssistantGateway {
    async fn invoke(&self, request: AssistantRequest) -> Result<AssistantReply, GatewayError> {
        tracing::info!(
            owner_id = %request.owner_id,
            session_id = %request.session_id,
            "Simulated assistant processing request"
        );

        if self.recording {
            self.history
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request);
        }

        // Decide the outcome before awaiting; ThreadRng is not Send
        let outcome = match self.behavior() {
            MockBehavior::Simulated => Ok(Self::simulated_reply()),
            MockBehavior::Scripted(reply) => Ok(reply),
            MockBehavior::Unavailable => Err(GatewayError::Status {
                status: 503,
                body: "simulated outage".to_string(),
            }),
        };

        let delay = *self.delay.read().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        outcome
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
