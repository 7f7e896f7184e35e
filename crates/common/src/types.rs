use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rejected raw product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("product id must be a positive integer, got {0}")]
pub struct InvalidProductId(pub i64);

/// Identity of a product, shared as the foreign key by reviews and recommendations.
///
/// Always strictly positive. Serializes as a bare JSON number so it can be used
/// directly as the event partition key and in downstream payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a product ID, rejecting zero and negative values.
    pub fn new(raw: i64) -> Result<Self, InvalidProductId> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(InvalidProductId(raw))
        }
    }

    /// Returns the raw numeric value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for ProductId {
    type Error = InvalidProductId;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ProductId> for i64 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

/// Correlation identifier for one write workflow (create or delete).
///
/// Only appears in logs; it ties the steps of a workflow and any compensation
/// it triggers together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    /// Creates a new random workflow ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_rejects_non_positive_values() {
        assert_eq!(ProductId::new(0), Err(InvalidProductId(0)));
        assert_eq!(ProductId::new(-7), Err(InvalidProductId(-7)));
        assert_eq!(ProductId::new(1).unwrap().as_i64(), 1);
    }

    #[test]
    fn product_id_serializes_as_number() {
        let id = ProductId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn product_id_deserialization_validates() {
        let ok: ProductId = serde_json::from_str("13").unwrap();
        assert_eq!(ok.as_i64(), 13);
        assert!(serde_json::from_str::<ProductId>("0").is_err());
        assert!(serde_json::from_str::<ProductId>("-1").is_err());
    }

    #[test]
    fn workflow_id_new_creates_unique_ids() {
        let id1 = WorkflowId::new();
        let id2 = WorkflowId::new();
        assert_ne!(id1, id2);
    }
}
