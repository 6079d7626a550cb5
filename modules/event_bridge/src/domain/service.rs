use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument};

use crate::domain::error::DomainError;
use crate::domain::event::Event;
use crate::domain::ports::{EventPublisher, PublishError};

/// Bridge service: normalize one event and forward it, once.
/// Depends only on the publisher port, not on the transport.
#[derive(Clone)]
pub struct BridgeService {
    publisher: Arc<dyn EventPublisher>,
    publish_timeout: Option<Duration>,
}

impl BridgeService {
    pub fn new(publisher: Arc<dyn EventPublisher>, publish_timeout: Option<Duration>) -> Self {
        Self {
            publisher,
            publish_timeout,
        }
    }

    /// Returns the event as it was forwarded (topic defaulted if needed).
    /// No retry: the first failure is returned to the caller.
    #[instrument(
        name = "event_bridge.service.publish",
        skip(self, event),
        fields(topic = tracing::field::Empty, payload_len = event.payload.len())
    )]
    pub async fn publish(&self, event: Event) -> Result<Event, DomainError> {
        let event = event.normalized();
        tracing::Span::current().record("topic", event.topic.as_str());

        let attempt = self.publisher.publish(&event.topic, &event.payload);
        let outcome = match self.publish_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt)
                .await
                .unwrap_or_else(|_| Err(PublishError::TimedOut(limit))),
            None => attempt.await,
        };

        match outcome {
            Ok(()) => {
                debug!("event forwarded");
                Ok(event)
            }
            Err(e) => {
                error!(error = %e, "publish failed");
                Err(DomainError::from(e))
            }
        }
    }
}
