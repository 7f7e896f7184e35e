//! The composite product aggregate and its parts.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::records::{Recommendation, Review};

/// Display projection of a review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSummary {
    pub review_id: i64,
    pub author: String,
    pub subject: String,
    pub content: String,
}

impl From<&Review> for ReviewSummary {
    fn from(review: &Review) -> Self {
        Self {
            review_id: review.review_id,
            author: review.author.clone(),
            subject: review.subject.clone(),
            content: review.content.clone(),
        }
    }
}

/// Display projection of a recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationSummary {
    pub recommendation_id: i64,
    pub author: String,
    pub rating: i32,
    pub content: String,
}

impl From<&Recommendation> for RecommendationSummary {
    fn from(recommendation: &Recommendation) -> Self {
        Self {
            recommendation_id: recommendation.recommendation_id,
            author: recommendation.author.clone(),
            rating: recommendation.rating,
            content: recommendation.content.clone(),
        }
    }
}

/// One network address per contributing service, including the orchestrator's own.
///
/// An empty string means the dependency contributed no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAddresses {
    pub orchestration_address: String,
    pub product_address: String,
    pub review_address: String,
    pub recommendation_address: String,
}

/// The merged, read-only composite returned to callers.
///
/// Only built by [`AggregateBuilder`](crate::AggregateBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAggregate {
    pub product_id: ProductId,
    pub name: String,
    pub weight: i32,
    pub recommendation_summaries: Vec<RecommendationSummary>,
    pub review_summaries: Vec<ReviewSummary>,
    pub service_addresses: ServiceAddresses,
    pub warnings: Vec<String>,
}

/// Body of a create request.
///
/// `product_id` stays raw so that a missing or non-positive id is reported as
/// invalid input by the orchestrator instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateInput {
    pub product_id: Option<i64>,
    pub name: String,
    pub weight: i32,
    pub review_summaries: Vec<ReviewSummary>,
    pub recommendation_summaries: Vec<RecommendationSummary>,
}
