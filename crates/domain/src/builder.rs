//! Fan-in of downstream records into a [`ProductAggregate`].

use crate::aggregate::{ProductAggregate, RecommendationSummary, ReviewSummary, ServiceAddresses};
use crate::records::{Product, Recommendation, Review};

/// Warning attached when the review dependency contributed nothing.
pub const EMPTY_REVIEWS_WARNING: &str = "Empty product review";

/// Warning attached when the recommendation dependency contributed nothing.
pub const EMPTY_RECOMMENDATIONS_WARNING: &str = "Empty product recommendations";

/// Merges a product with its reviews and recommendations.
///
/// Pure and deterministic: no I/O, no errors, and identical inputs always yield an
/// identical aggregate (summary order follows input order, the review warning always
/// precedes the recommendation warning).
#[derive(Debug, Clone)]
pub struct AggregateBuilder {
    own_address: String,
}

impl AggregateBuilder {
    /// Creates a builder that stamps aggregates with the orchestrator's address.
    pub fn new(own_address: impl Into<String>) -> Self {
        Self {
            own_address: own_address.into(),
        }
    }

    /// Returns the orchestrator address reported in every aggregate.
    pub fn own_address(&self) -> &str {
        &self.own_address
    }

    /// Builds the aggregate.
    ///
    /// The serving address of a list is the address of its first element; it is a
    /// best-available-instance hint, not a guarantee of which instance answered.
    pub fn build(
        &self,
        product: &Product,
        reviews: &[Review],
        recommendations: &[Recommendation],
    ) -> ProductAggregate {
        let mut warnings = Vec::new();

        let review_address = match reviews.first() {
            Some(first) => first.service_address.clone().unwrap_or_default(),
            None => {
                warnings.push(EMPTY_REVIEWS_WARNING.to_string());
                String::new()
            }
        };

        let recommendation_address = match recommendations.first() {
            Some(first) => first.service_address.clone().unwrap_or_default(),
            None => {
                warnings.push(EMPTY_RECOMMENDATIONS_WARNING.to_string());
                String::new()
            }
        };

        ProductAggregate {
            product_id: product.product_id,
            name: product.name.clone(),
            weight: product.weight,
            recommendation_summaries: recommendations
                .iter()
                .map(RecommendationSummary::from)
                .collect(),
            review_summaries: reviews.iter().map(ReviewSummary::from).collect(),
            service_addresses: ServiceAddresses {
                orchestration_address: self.own_address.clone(),
                product_address: product.service_address.clone().unwrap_or_default(),
                review_address,
                recommendation_address,
            },
            warnings,
        }
    }
}
