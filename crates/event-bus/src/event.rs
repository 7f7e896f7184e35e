use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// Kind of change an event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Create,
    Delete,
}

impl EventType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Create => "CREATE",
            EventType::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed per-entity topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Products,
    Reviews,
    Recommendations,
}

impl Topic {
    /// All topics, in the order compensation publishes to them.
    pub const ALL: [Topic; 3] = [Topic::Products, Topic::Reviews, Topic::Recommendations];

    /// Returns the topic name on the bus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Products => "products",
            Topic::Reviews => "reviews",
            Topic::Recommendations => "recommendations",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The wire unit of the asynchronous path.
///
/// `key` is the partition key: every event for the same product id is delivered
/// through the same ordered lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<T> {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub key: ProductId,
    pub payload: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Event<T> {
    /// A CREATE event carrying the full record.
    pub fn create(key: ProductId, payload: T) -> Self {
        Self {
            event_type: EventType::Create,
            key,
            payload: Some(payload),
            timestamp: Utc::now(),
        }
    }

    /// A DELETE event for every record of `key`; carries no payload.
    pub fn delete(key: ProductId) -> Self {
        Self {
            event_type: EventType::Delete,
            key,
            payload: None,
            timestamp: Utc::now(),
        }
    }
}

/// An event serialized and addressed, as handed to an [`EventSink`](crate::EventSink).
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub topic: Topic,
    pub partition_key: ProductId,
    pub event_type: EventType,
    pub body: serde_json::Value,
}

impl OutboundMessage {
    /// Serializes `event` and addresses it to `topic`.
    pub fn encode<T: Serialize>(topic: Topic, event: &Event<T>) -> Result<Self, PublishError> {
        Ok(Self {
            topic,
            partition_key: event.key,
            event_type: event.event_type,
            body: serde_json::to_value(event)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
    }

    #[test]
    fn create_event_wire_shape() {
        let key = ProductId::new(7).unwrap();
        let event = Event::create(
            key,
            Payload {
                name: "lamp".to_string(),
            },
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CREATE");
        assert_eq!(json["key"], 7);
        assert_eq!(json["payload"]["name"], "lamp");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn delete_event_has_null_payload() {
        let event: Event<Payload> = Event::delete(ProductId::new(7).unwrap());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DELETE");
        assert!(json["payload"].is_null());
    }

    #[test]
    fn topic_names_are_fixed() {
        let names: Vec<&str> = Topic::ALL.iter().map(Topic::as_str).collect();
        assert_eq!(names, vec!["products", "reviews", "recommendations"]);
    }
}
