//! Tokochat chat client
//!
//! Client-side logic for a chat surface:
//! - Surface state machine (gated, idle, composing, sending)
//! - Transcript that merges optimistic entries with confirmed messages
//! - HTTP transport for the chat API

pub mod state;
pub mod surface;
pub mod transcript;
pub mod transport;

pub use state::{StateError, SurfaceEvent, SurfaceGuardContext, SurfaceState, SurfaceStateMachine};
pub use surface::{ChatSurface, SurfaceConfig};
pub use transcript::{EntryStatus, Transcript, TranscriptEntry};
pub use transport::{
    ChatMessage, ChatTransport, HttpChatTransport, Role, TransportError, TurnPayload, TurnResponse,
};
