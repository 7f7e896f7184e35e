use thiserror::Error;

/// Errors returned when submitting an event to the publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The publisher already holds `queue_depth` undelivered events.
    #[error("publish queue saturated: {queue_depth} events awaiting delivery")]
    Backpressure { queue_depth: usize },

    /// A delivery lane stopped while a batch was being enqueued. The first
    /// `accepted` events of the batch will still be delivered.
    #[error("publisher lane stopped after accepting {accepted} of {total} events")]
    Interrupted { accepted: usize, total: usize },

    /// The publisher has been drained and accepts no new events.
    #[error("publisher is closed")]
    Closed,

    /// The event could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by an [`EventSink`](crate::EventSink) while delivering.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Could not reach the message bus.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The message bus rejected the message.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The message body could not be encoded for the bus.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
