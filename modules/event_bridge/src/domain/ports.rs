use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the pub/sub channel. The message is surfaced to the
/// HTTP caller as-is.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{0}")]
    Channel(String),
    #[error("publish timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl PublishError {
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel(message.into())
    }
}

/// Output port: hand one event to the external pub/sub channel.
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError>;
}
