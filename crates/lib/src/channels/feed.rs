//! Seams between the polling loop and a messaging platform.

use crate::channels::InboundMessage;
use async_trait::async_trait;

/// Source of pending inbound messages.
///
/// Failures are absorbed by the implementation: it logs and returns an empty batch so the loop
/// simply tries again on the next tick. There is no acknowledgement, so a call may return
/// messages that were already returned before.
#[async_trait]
pub trait UpdateFeed: Send + Sync {
    async fn fetch_pending(&self) -> Vec<InboundMessage>;
}

/// Sends one text reply to a conversation.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn send(&self, conversation_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// A reply could not be delivered. Logged by the caller, never retried.
#[derive(Debug, thiserror::Error)]
#[error("delivery to conversation {conversation_id} failed: {reason}")]
pub struct DeliveryError {
    pub conversation_id: i64,
    pub reason: String,
}
