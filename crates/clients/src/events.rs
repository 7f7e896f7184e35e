//! Event-driven forms of the create and delete operations.

use std::marker::PhantomData;
use std::sync::Arc;

use domain::{Keyed, OrchestrationError, Product, ProductId, Recommendation, Result, Review};
use event_bus::{Event, EventPublisher, OutboundMessage, PublishError, Topic};
use serde::Serialize;

/// Publishes create/delete events for one record type to its topic.
///
/// Each call returns once the event is accepted by the publisher. The backing
/// service applies it later.
pub struct EventClient<T> {
    publisher: Arc<EventPublisher>,
    topic: Topic,
    _record: PhantomData<fn(&T)>,
}

impl<T> Clone for EventClient<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: Arc::clone(&self.publisher),
            topic: self.topic,
            _record: PhantomData,
        }
    }
}

impl<T: Keyed + Serialize> EventClient<T> {
    pub fn new(publisher: Arc<EventPublisher>, topic: Topic) -> Self {
        Self {
            publisher,
            topic,
            _record: PhantomData,
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Publishes a CREATE event keyed by the record's product id.
    pub fn publish_create(&self, record: &T) -> Result<()> {
        self.publisher
            .publish(self.topic, &Event::create(record.product_id(), record))
            .map_err(publish_failure)
    }

    fn create_message(&self, record: &T) -> Result<OutboundMessage> {
        OutboundMessage::encode(self.topic, &Event::create(record.product_id(), record))
            .map_err(publish_failure)
    }

    /// Publishes a payload-less DELETE event for `product_id`.
    pub fn publish_delete(&self, product_id: ProductId) -> Result<()> {
        self.publisher
            .publish(self.topic, &Event::<()>::delete(product_id))
            .map_err(publish_failure)
    }
}

fn publish_failure(err: PublishError) -> OrchestrationError {
    match err {
        PublishError::Backpressure { .. }
        | PublishError::Closed
        | PublishError::Interrupted { .. } => {
            OrchestrationError::Backpressure(err.to_string())
        }
        PublishError::Serialization(e) => OrchestrationError::Upstream {
            status: 500,
            body: e.to_string(),
        },
    }
}

/// A composite create the publisher did not take in full.
#[derive(Debug)]
pub struct CreateRejected {
    pub error: OrchestrationError,
    /// Events of the create that were accepted and will still be delivered.
    pub accepted: usize,
}

/// Event clients for the three record types, sharing one publisher.
#[derive(Clone)]
pub struct AggregateEvents {
    pub products: EventClient<Product>,
    pub reviews: EventClient<Review>,
    pub recommendations: EventClient<Recommendation>,
    publisher: Arc<EventPublisher>,
}

impl AggregateEvents {
    pub fn new(publisher: Arc<EventPublisher>) -> Self {
        Self {
            products: EventClient::new(Arc::clone(&publisher), Topic::Products),
            reviews: EventClient::new(Arc::clone(&publisher), Topic::Reviews),
            recommendations: EventClient::new(Arc::clone(&publisher), Topic::Recommendations),
            publisher,
        }
    }

    /// Publishes the CREATE events of one composite product as a single batch,
    /// product first.
    ///
    /// Either every event is accepted or, unless a delivery lane stopped midway,
    /// none is.
    pub fn publish_creates(
        &self,
        product: &Product,
        reviews: &[Review],
        recommendations: &[Recommendation],
    ) -> std::result::Result<(), CreateRejected> {
        let rejected = |error| CreateRejected { error, accepted: 0 };

        let mut batch = Vec::with_capacity(1 + reviews.len() + recommendations.len());
        batch.push(self.products.create_message(product).map_err(rejected)?);
        for review in reviews {
            batch.push(self.reviews.create_message(review).map_err(rejected)?);
        }
        for recommendation in recommendations {
            batch.push(
                self.recommendations
                    .create_message(recommendation)
                    .map_err(rejected)?,
            );
        }

        self.publisher.publish_batch(batch).map_err(|e| CreateRejected {
            accepted: match e {
                PublishError::Interrupted { accepted, .. } => accepted,
                _ => 0,
            },
            error: publish_failure(e),
        })
    }
}
