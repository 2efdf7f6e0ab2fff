//! Conversation services: the turn relay and the history reader

pub mod history;
pub mod relay;

pub use history::HistoryReader;
pub use relay::{MessageRelay, TurnRequest};
