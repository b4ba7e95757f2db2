//! Event Publisher Port (Driven Port)
//!
//! Interface for publishing position lifecycle events to observers.

use async_trait::async_trait;
use tracing::info;

use crate::simulation::PositionEvent;

/// Event publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventPublishError {
    /// Serialization error.
    #[error("Event serialization error: {message}")]
    SerializationError {
        /// Error details.
        message: String,
    },

    /// Publishing failed.
    #[error("Event publish failed: {message}")]
    PublishFailed {
        /// Error details.
        message: String,
    },
}

/// Port for publishing position events.
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Publish events in order.
    async fn publish_events(&self, events: Vec<PositionEvent>) -> Result<(), EventPublishError>;

    /// Publish a single event.
    async fn publish(&self, event: PositionEvent) -> Result<(), EventPublishError> {
        self.publish_events(vec![event]).await
    }
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisherPort for NoOpEventPublisher {
    async fn publish_events(&self, _events: Vec<PositionEvent>) -> Result<(), EventPublishError> {
        Ok(())
    }
}

/// Logs every event as JSON through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisherPort for TracingEventPublisher {
    async fn publish_events(&self, events: Vec<PositionEvent>) -> Result<(), EventPublishError> {
        for event in events {
            let payload = serde_json::to_string(&event).map_err(|e| {
                EventPublishError::SerializationError {
                    message: e.to_string(),
                }
            })?;
            info!(
                event = event.kind(),
                position_id = %event.position_id(),
                payload = %payload,
                "Position event"
            );
        }
        Ok(())
    }
}
