//! One chat surface: a modal, a product drawer, a history page.
//!
//! Each surface owns its transcript, draft, and state. Surfaces are built
//! fresh on open and dropped on close; two surfaces never share state, so
//! a product drawer and the general assistant can both be sending at once.
//!
//! A turn is split into `begin_submit` (optimistic, synchronous) and
//! `complete_submit` (applies the server result); `submit` runs both
//! around the transport call.

use crate::state::{
    StateError, SurfaceEvent, SurfaceGuardContext, SurfaceState, SurfaceStateMachine,
};
use crate::transcript::Transcript;
use crate::transport::{ChatTransport, TransportError, TurnPayload, TurnResponse};

/// What a surface is about and who may use it
#[derive(Debug, Clone, Default)]
pub struct SurfaceConfig {
    /// Product or subject; `None` for the general assistant
    pub topic_ref: Option<String>,
    /// Grounding data sent with every turn
    pub context: Option<serde_json::Value>,
    /// Show the sign-in gate instead of chat when there is no identity
    pub requires_auth: bool,
    /// History page size; server default when absent
    pub history_limit: Option<i64>,
}

impl SurfaceConfig {
    /// General assistant surface
    pub fn general() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    /// Surface attached to one product
    pub fn for_topic(topic_ref: impl Into<String>, context: Option<serde_json::Value>) -> Self {
        Self {
            topic_ref: Some(topic_ref.into()),
            context,
            requires_auth: true,
            history_limit: None,
        }
    }
}

pub struct ChatSurface<T: ChatTransport> {
    transport: T,
    config: SurfaceConfig,
    state: SurfaceState,
    transcript: Transcript,
    draft: String,
    typing: bool,
    suggestions: Vec<String>,
    error: Option<String>,
    last_reply_fallback: bool,
}

impl<T: ChatTransport> ChatSurface<T> {
    /// Open a surface and load its history.
    ///
    /// Gated surfaces make no network calls. A history failure leaves an
    /// empty, usable surface with the error affordance set.
    pub async fn open(transport: T, config: SurfaceConfig) -> Self {
        let gated = config.requires_auth && !transport.has_identity();

        let mut surface = Self {
            transport,
            config,
            state: if gated {
                SurfaceState::Gated
            } else {
                SurfaceState::Idle
            },
            transcript: Transcript::new(),
            draft: String::new(),
            typing: false,
            suggestions: Vec::new(),
            error: None,
            last_reply_fallback: false,
        };

        if gated {
            tracing::debug!(topic_ref = ?surface.config.topic_ref, "Chat surface gated");
            return surface;
        }

        // Anonymous callers have no history to load
        if surface.transport.has_identity() {
            surface.refresh().await;
        }

        surface
    }

    /// Reload history from the server, replacing the transcript.
    /// Skipped while gated or while a turn is in flight.
    pub async fn refresh(&mut self) {
        if !self.state.accepts_input() {
            return;
        }

        match self
            .transport
            .fetch_history(self.config.topic_ref.as_deref(), self.config.history_limit)
            .await
        {
            Ok(messages) => {
                self.transcript.hydrate(messages);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load chat history");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Replace the input box content
    pub fn set_draft(&mut self, text: impl Into<String>) -> Result<(), StateError> {
        let text = text.into();
        let event = if text.trim().is_empty() {
            SurfaceEvent::Clear
        } else {
            SurfaceEvent::Edit
        };

        self.state = SurfaceStateMachine::transition(self.state, event, None)?;
        self.draft = text;
        Ok(())
    }

    /// Put a quick-reply suggestion into the input box
    pub fn select_suggestion(&mut self, index: usize) -> Result<(), StateError> {
        let suggestion = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or_else(|| StateError::GuardFailed(format!("No suggestion at {}", index)))?;
        self.set_draft(suggestion)
    }

    /// Start a turn with the current draft: show it optimistically, clear the
    /// input, show the typing indicator. Returns what to send.
    pub fn begin_submit(&mut self) -> Result<TurnPayload, StateError> {
        let guard = SurfaceGuardContext {
            draft_is_blank: self.draft.trim().is_empty(),
        };
        let next = SurfaceStateMachine::transition(self.state, SurfaceEvent::Submit, Some(&guard))?;

        let text = std::mem::take(&mut self.draft);
        self.transcript.push_optimistic(text.clone());
        self.enter_sending(next);

        Ok(self.payload(text))
    }

    /// Start resending the most recent failed message
    pub fn begin_retry(&mut self) -> Result<TurnPayload, StateError> {
        let next = SurfaceStateMachine::transition(self.state, SurfaceEvent::Retry, None)?;

        let text = self
            .transcript
            .take_last_failed()
            .ok_or_else(|| StateError::GuardFailed("Nothing to retry".to_string()))?;
        self.transcript.push_optimistic(text.clone());
        self.enter_sending(next);

        Ok(self.payload(text))
    }

    /// Apply the outcome of the turn started by `begin_submit`/`begin_retry`
    pub fn complete_submit(&mut self, result: Result<TurnResponse, TransportError>) {
        let event = match result {
            Ok(_) => SurfaceEvent::Succeed,
            Err(_) => SurfaceEvent::Fail,
        };
        let next = match SurfaceStateMachine::transition(self.state, event, None) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(error = %e, "Turn result arrived with no turn in flight");
                return;
            }
        };

        self.typing = false;
        self.state = next;

        match result {
            Ok(response) => {
                self.transcript.reconcile(response.user_message);
                self.transcript.reconcile(response.assistant_message);
                self.suggestions = response.suggestions;
                self.last_reply_fallback = response.fallback;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat turn failed");
                self.transcript.fail_pending();
                self.error = Some(e.to_string());
            }
        }
    }

    /// Send the current draft and wait for the answer
    pub async fn submit(&mut self) -> Result<(), StateError> {
        let payload = self.begin_submit()?;
        let result = self.transport.submit_turn(&payload).await;
        self.complete_submit(result);
        Ok(())
    }

    /// Resend the most recent failed message and wait for the answer
    pub async fn retry(&mut self) -> Result<(), StateError> {
        let payload = self.begin_retry()?;
        let result = self.transport.submit_turn(&payload).await;
        self.complete_submit(result);
        Ok(())
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn enter_sending(&mut self, next: SurfaceState) {
        self.state = next;
        self.typing = true;
        self.suggestions.clear();
        self.error = None;
    }

    fn payload(&self, message: String) -> TurnPayload {
        TurnPayload {
            message,
            topic_ref: self.config.topic_ref.clone(),
            context: self.config.context.clone(),
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_gated(&self) -> bool {
        self.state == SurfaceState::Gated
    }

    pub fn input_enabled(&self) -> bool {
        self.state.accepts_input()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Typing indicator
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Non-blocking error affordance
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The last assistant answer was the fallback reply
    pub fn last_reply_was_fallback(&self) -> bool {
        self.last_reply_fallback
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
