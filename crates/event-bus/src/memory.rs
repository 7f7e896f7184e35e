use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};

use crate::error::SinkError;
use crate::event::{OutboundMessage, Topic};
use crate::sink::EventSink;

/// In-memory event sink for testing.
///
/// Records every delivered message in delivery order. Deliveries can be held back
/// with [`pause`](Self::pause) to simulate a slow bus.
#[derive(Clone)]
pub struct InMemoryEventSink {
    delivered: Arc<RwLock<Vec<OutboundMessage>>>,
    gate: Arc<watch::Sender<bool>>,
    fail: Arc<AtomicBool>,
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            delivered: Arc::new(RwLock::new(Vec::new())),
            gate: Arc::new(gate),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InMemoryEventSink {
    /// Creates a new empty sink that delivers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every subsequent delivery until [`resume`](Self::resume) is called.
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    /// Releases held deliveries.
    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    /// Makes every subsequent delivery fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns all delivered messages in delivery order.
    pub async fn messages(&self) -> Vec<OutboundMessage> {
        self.delivered.read().await.clone()
    }

    /// Returns delivered messages for one topic, in delivery order.
    pub async fn messages_for(&self, topic: Topic) -> Vec<OutboundMessage> {
        self.delivered
            .read()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Returns the total number of delivered messages.
    pub async fn message_count(&self) -> usize {
        self.delivered.read().await.len()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), SinkError> {
        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Delivery("bus unavailable".to_string()));
        }

        self.delivered.write().await.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use common::ProductId;

    fn message(topic: Topic) -> OutboundMessage {
        OutboundMessage {
            topic,
            partition_key: ProductId::new(1).unwrap(),
            event_type: EventType::Create,
            body: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_records_deliveries_by_topic() {
        let sink = InMemoryEventSink::new();
        sink.deliver(&message(Topic::Products)).await.unwrap();
        sink.deliver(&message(Topic::Reviews)).await.unwrap();

        assert_eq!(sink.message_count().await, 2);
        assert_eq!(sink.messages_for(Topic::Reviews).await.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_deliver() {
        let sink = InMemoryEventSink::new();
        sink.set_fail(true);

        let result = sink.deliver(&message(Topic::Products)).await;
        assert!(matches!(result, Err(SinkError::Delivery(_))));
        assert_eq!(sink.message_count().await, 0);
    }
}
