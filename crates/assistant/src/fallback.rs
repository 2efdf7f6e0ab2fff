//! Deterministic reply used when the reasoning backend cannot answer.

use crate::AssistantReply;

/// Reply shown in place of an assistant answer
pub const FALLBACK_REPLY: &str = "Sorry, our assistant is not available right now. \
Please try again in a moment, or contact our customer service team for help with your order.";

/// Generic follow-up questions offered with the fallback reply
pub const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "How do I place an order?",
    "What payment methods are accepted?",
    "How can I contact customer service?",
];

/// Build the fallback reply. Same output on every call.
pub fn fallback_reply() -> AssistantReply {
    AssistantReply::new(
        FALLBACK_REPLY,
        FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    )
}
