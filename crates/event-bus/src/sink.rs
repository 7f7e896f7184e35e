//! Delivery target of the publisher.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::OutboundMessage;

/// A message bus the publisher delivers to.
///
/// Called from one lane at a time per partition, so an implementation that
/// completes `deliver` in call order preserves per-key ordering.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one message to its topic.
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), SinkError>;
}

/// Sink that only logs deliveries, for running without a message bus.
#[derive(Debug, Clone, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), SinkError> {
        tracing::info!(
            topic = %message.topic,
            key = %message.partition_key,
            event_type = %message.event_type,
            body = %message.body,
            "event delivered"
        );
        Ok(())
    }
}
