//! Domain layer for the product orchestration service.
//!
//! This crate provides:
//! - Downstream records as owned by the product, review and recommendation services
//! - The composite `ProductAggregate` and its summary projections
//! - `AggregateBuilder`, the pure fan-in from records to aggregate
//! - `OrchestrationError`, the error taxonomy shared by clients and workflows

pub mod aggregate;
pub mod builder;
pub mod error;
pub mod records;

pub use aggregate::{
    AggregateInput, ProductAggregate, RecommendationSummary, ReviewSummary, ServiceAddresses,
};
pub use builder::{AggregateBuilder, EMPTY_RECOMMENDATIONS_WARNING, EMPTY_REVIEWS_WARNING};
pub use common::ProductId;
pub use error::{OrchestrationError, Result};
pub use records::{Keyed, Product, Recommendation, Review};
