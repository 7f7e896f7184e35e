//! Bounded, partitioned worker pool for asynchronous event delivery.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::ProductId;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::error::PublishError;
use crate::event::{Event, OutboundMessage, Topic};
use crate::sink::EventSink;

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Number of delivery lanes, one task each.
    pub workers: usize,
    /// Maximum number of accepted events not yet delivered.
    pub queue_depth: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_depth: 100,
        }
    }
}

struct Delivery {
    message: OutboundMessage,
    // Returned to the pool once the sink has finished with the message.
    _slot: OwnedSemaphorePermit,
}

/// Offloads event delivery from request handling.
///
/// `publish` completes once the event is accepted into the pool, not once it is
/// delivered. Events are routed to a lane by hashing their partition key, so
/// events for one key are delivered by a single task in submission order. When
/// `queue_depth` events are awaiting delivery, `publish` fails fast with
/// [`PublishError::Backpressure`].
pub struct EventPublisher {
    lanes: Vec<mpsc::Sender<Delivery>>,
    slots: Arc<Semaphore>,
    queue_depth: usize,
    accepting: AtomicBool,
}

impl EventPublisher {
    /// Starts the lanes on the current tokio runtime.
    pub fn start<K>(sink: K, config: PublisherConfig) -> Self
    where
        K: EventSink + 'static,
    {
        let workers = config.workers.max(1);
        let queue_depth = config.queue_depth.max(1);
        let sink = Arc::new(sink);

        let lanes = (0..workers)
            .map(|lane| {
                let (tx, rx) = mpsc::channel(queue_depth);
                tokio::spawn(run_lane(lane, rx, Arc::clone(&sink)));
                tx
            })
            .collect();

        tracing::info!(workers, queue_depth, "event publisher started");

        Self {
            lanes,
            slots: Arc::new(Semaphore::new(queue_depth)),
            queue_depth,
            accepting: AtomicBool::new(true),
        }
    }

    /// Enqueues an event for delivery to `topic`.
    pub fn publish<T: Serialize>(&self, topic: Topic, event: &Event<T>) -> Result<(), PublishError> {
        self.publish_batch(vec![OutboundMessage::encode(topic, event)?])
    }

    /// Enqueues a batch of messages, all or none.
    ///
    /// Capacity for the whole batch is reserved before anything is enqueued, so a
    /// [`PublishError::Backpressure`] rejection means no message of the batch was
    /// accepted. A batch larger than `queue_depth` is always rejected.
    pub fn publish_batch(&self, messages: Vec<OutboundMessage>) -> Result<(), PublishError> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }
        if messages.is_empty() {
            return Ok(());
        }

        let total = messages.len();
        let requested = u32::try_from(total).map_err(|_| self.saturated(total))?;
        let mut reserved = match Arc::clone(&self.slots).try_acquire_many_owned(requested) {
            Ok(reserved) => reserved,
            Err(TryAcquireError::NoPermits) => return Err(self.saturated(total)),
            Err(TryAcquireError::Closed) => return Err(PublishError::Closed),
        };

        let slots = std::iter::from_fn(|| reserved.split(1));
        for (accepted, (message, slot)) in messages.into_iter().zip(slots).enumerate() {
            let topic = message.topic;
            let key = message.partition_key;
            let event_type = message.event_type;

            let delivery = Delivery {
                message,
                _slot: slot,
            };
            if self.lanes[self.lane_for(key)].try_send(delivery).is_err() {
                // Lanes are sized to hold every permit, so only a stopped lane refuses
                tracing::error!(%topic, %key, accepted, total, "publisher lane stopped");
                return Err(PublishError::Interrupted { accepted, total });
            }

            metrics::counter!("event_publish_accepted_total").increment(1);
            tracing::debug!(%topic, %key, %event_type, "event accepted");
        }
        Ok(())
    }

    fn saturated(&self, requested: usize) -> PublishError {
        metrics::counter!("event_publish_rejected_total").increment(1);
        tracing::warn!(
            requested,
            in_flight = self.in_flight(),
            queue_depth = self.queue_depth,
            "publish rejected, queue saturated"
        );
        PublishError::Backpressure {
            queue_depth: self.queue_depth,
        }
    }

    /// Number of accepted events not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.queue_depth - self.slots.available_permits()
    }

    /// Returns the configured queue depth.
    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Stops accepting events and waits until every accepted event is delivered.
    pub async fn drain(&self) {
        self.accepting.store(false, Ordering::Release);

        let all = u32::try_from(self.queue_depth).unwrap_or(u32::MAX);
        if let Ok(slots) = self.slots.acquire_many(all).await {
            drop(slots);
        }
        self.slots.close();

        tracing::info!("event publisher drained");
    }

    fn lane_for(&self, key: ProductId) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.lanes.len() as u64) as usize
    }
}

async fn run_lane<K: EventSink>(lane: usize, mut rx: mpsc::Receiver<Delivery>, sink: Arc<K>) {
    while let Some(delivery) = rx.recv().await {
        let message = &delivery.message;
        if let Err(e) = sink.deliver(message).await {
            metrics::counter!("event_delivery_failures_total").increment(1);
            tracing::warn!(
                lane,
                topic = %message.topic,
                key = %message.partition_key,
                error = %e,
                "event delivery failed"
            );
        }
    }
    tracing::debug!(lane, "publisher lane stopped");
}
