//! Inbound message from a channel: the unit the polling loop filters, dedups and answers.

/// A text message received from the update feed. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Conversation the reply goes to (Telegram chat id).
    pub conversation_id: i64,
    pub sender_id: i64,
    /// Provider-assigned id; increases with arrival order within one chat feed.
    pub message_id: i64,
    /// Unix seconds at which the platform received the message.
    pub sent_at: i64,
    pub text: String,
}
