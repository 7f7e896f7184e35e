//! Downstream records, in the shape owned by each backend service.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateInput, RecommendationSummary, ReviewSummary};

/// Implemented by records that belong to a product and are routed by its id.
pub trait Keyed {
    /// The product this record belongs to.
    fn product_id(&self) -> ProductId;
}

/// A product as owned by the product service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weight: i32,
    /// Network identity of the instance that answered. Never sent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
}

impl Product {
    /// Maps the product part of a create request.
    pub fn from_input(input: &AggregateInput, product_id: ProductId) -> Self {
        Self {
            product_id,
            name: input.name.clone(),
            weight: input.weight,
            service_address: None,
        }
    }
}

impl Keyed for Product {
    fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// A review as owned by the review service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub product_id: ProductId,
    pub review_id: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
}

impl Review {
    /// Stamps a review summary with the owning product id.
    pub fn from_summary(summary: &ReviewSummary, product_id: ProductId) -> Self {
        Self {
            product_id,
            review_id: summary.review_id,
            author: summary.author.clone(),
            subject: summary.subject.clone(),
            content: summary.content.clone(),
            service_address: None,
        }
    }
}

impl Keyed for Review {
    fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// A recommendation as owned by the recommendation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product_id: ProductId,
    pub recommendation_id: i64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_address: Option<String>,
}

impl Recommendation {
    /// Stamps a recommendation summary with the owning product id.
    pub fn from_summary(summary: &RecommendationSummary, product_id: ProductId) -> Self {
        Self {
            product_id,
            recommendation_id: summary.recommendation_id,
            author: summary.author.clone(),
            rating: summary.rating,
            content: summary.content.clone(),
            service_address: None,
        }
    }
}

impl Keyed for Recommendation {
    fn product_id(&self) -> ProductId {
        self.product_id
    }
}
