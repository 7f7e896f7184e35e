//! Asynchronous event path of the product orchestration service.
//!
//! Create/delete notifications are wrapped in an [`Event`] envelope, routed to one
//! of three fixed [`Topic`]s and handed to an [`EventPublisher`], a bounded worker
//! pool that delivers them to an [`EventSink`] off the request path.

pub mod error;
pub mod event;
pub mod memory;
pub mod publisher;
pub mod redis_stream;
pub mod sink;

pub use common::ProductId;
pub use error::{PublishError, SinkError};
pub use event::{Event, EventType, OutboundMessage, Topic};
pub use memory::InMemoryEventSink;
pub use publisher::{EventPublisher, PublisherConfig};
pub use redis_stream::RedisStreamSink;
pub use sink::{EventSink, TracingEventSink};
