//! The two broker operations the console depends on.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the publish/subscribe client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    #[error("Subscribe to {pattern} failed: {reason}")]
    Subscribe { pattern: String, reason: String },

    #[error("Disconnect failed: {0}")]
    Disconnect(String),
}

/// Outbound side of a publish/subscribe client.
///
/// Both calls are fire-and-forget from the console's point of view: success
/// means the client accepted the request, not that the bike received it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    async fn subscribe(&self, pattern: &str) -> Result<(), TransportError>;
}
