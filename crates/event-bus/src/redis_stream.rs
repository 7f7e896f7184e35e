//! Redis Streams-backed sink.
//!
//! Each topic maps to one stream of the same name. Every entry carries the
//! partition key, the event type and the JSON body:
//!
//! ```text
//! XADD products * partitionKey 42 type CREATE payload {"type":"CREATE",...}
//! ```
//!
//! Consumers read with consumer groups and route by `partitionKey`.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use crate::error::SinkError;
use crate::event::OutboundMessage;
use crate::sink::EventSink;

/// Sink appending events to Redis Streams.
#[derive(Clone)]
pub struct RedisStreamSink {
    conn: MultiplexedConnection,
}

impl RedisStreamSink {
    /// Connects to Redis (e.g. `redis://localhost:6379`).
    pub async fn connect(redis_url: &str) -> Result<Self, SinkError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| SinkError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        tracing::info!("connected to redis event bus");
        Ok(Self { conn })
    }
}

#[async_trait]
impl EventSink for RedisStreamSink {
    #[tracing::instrument(
        skip(self, message),
        fields(topic = %message.topic, key = %message.partition_key)
    )]
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&message.body)?;
        let mut conn = self.conn.clone();

        let entry_id: String = redis::cmd("XADD")
            .arg(message.topic.as_str())
            .arg("*")
            .arg("partitionKey")
            .arg(message.partition_key.as_i64())
            .arg("type")
            .arg(message.event_type.as_str())
            .arg("payload")
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| SinkError::Delivery(e.to_string()))?;

        tracing::debug!(%entry_id, "event appended to stream");
        Ok(())
    }
}
