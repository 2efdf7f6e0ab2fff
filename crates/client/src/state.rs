//! State machine for a single chat surface
//!
//! States: Gated (terminal), Idle → Composing → Sending → Idle.
//! `Sending` always returns to `Idle`, whether the turn succeeded or not.

use thiserror::Error;

/// Errors that can occur during surface transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} to {to} via {event}")]
    InvalidTransition {
        from: String,
        to: String,
        event: String,
    },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),
}

/// Chat surface states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    /// Sign-in required; no network calls are made
    Gated,
    /// Nothing typed, nothing in flight
    Idle,
    /// Draft is non-empty
    Composing,
    /// A turn is in flight; input is disabled
    Sending,
}

impl SurfaceState {
    /// Whether the input box accepts text
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Idle | Self::Composing)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [SurfaceState] {
        match self {
            Self::Gated => &[],
            Self::Idle => &[Self::Idle, Self::Composing, Self::Sending],
            Self::Composing => &[Self::Idle, Self::Composing, Self::Sending],
            Self::Sending => &[Self::Idle],
        }
    }
}

impl std::fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gated => write!(f, "gated"),
            Self::Idle => write!(f, "idle"),
            Self::Composing => write!(f, "composing"),
            Self::Sending => write!(f, "sending"),
        }
    }
}

/// Events that trigger surface state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Draft changed to non-blank text
    Edit,
    /// Draft emptied
    Clear,
    /// Send the current draft
    Submit,
    /// Resend the last failed message
    Retry,
    /// Turn confirmed by the server
    Succeed,
    /// Turn could not be completed
    Fail,
}

impl std::fmt::Display for SurfaceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit => write!(f, "edit"),
            Self::Clear => write!(f, "clear"),
            Self::Submit => write!(f, "submit"),
            Self::Retry => write!(f, "retry"),
            Self::Succeed => write!(f, "succeed"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Guard context for surface transitions
#[derive(Debug, Clone, Default)]
pub struct SurfaceGuardContext {
    /// The draft is empty after trimming
    pub draft_is_blank: bool,
}

/// Chat surface state machine
pub struct SurfaceStateMachine;

impl SurfaceStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: SurfaceState,
        event: SurfaceEvent,
        context: Option<&SurfaceGuardContext>,
    ) -> Result<SurfaceState, StateError> {
        let next = match (&current, &event) {
            (SurfaceState::Idle | SurfaceState::Composing, SurfaceEvent::Edit) => {
                SurfaceState::Composing
            }
            (SurfaceState::Idle | SurfaceState::Composing, SurfaceEvent::Clear) => {
                SurfaceState::Idle
            }
            (SurfaceState::Composing, SurfaceEvent::Submit) => {
                // Guard: nothing to send
                if context.is_some_and(|ctx| ctx.draft_is_blank) {
                    return Err(StateError::GuardFailed(
                        "Cannot submit an empty message".to_string(),
                    ));
                }
                SurfaceState::Sending
            }
            // Guard: retry requires an empty input box
            (SurfaceState::Idle, SurfaceEvent::Retry) => SurfaceState::Sending,
            (SurfaceState::Sending, SurfaceEvent::Succeed | SurfaceEvent::Fail) => {
                SurfaceState::Idle
            }

            // Invalid transitions
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(
        current: SurfaceState,
        event: SurfaceEvent,
        context: Option<&SurfaceGuardContext>,
    ) -> bool {
        Self::transition(current, event, context).is_ok()
    }
}
