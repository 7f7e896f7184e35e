//! Clients for the three services behind the orchestrator.
//!
//! Each service is reached through a trait ([`ProductClient`], [`ReviewClient`],
//! [`RecommendationClient`]) with a REST implementation for production and an
//! in-memory implementation with latency and fault injection for tests. The
//! asynchronous create/delete forms go through [`AggregateEvents`].

pub mod classify;
pub mod events;
mod fault;
pub mod http;
pub mod product;
pub mod recommendation;
pub mod review;

pub use classify::classify;
pub use events::{AggregateEvents, CreateRejected, EventClient};
pub use fault::CallCounts;
pub use http::{Endpoint, HttpProductClient, HttpRecommendationClient, HttpReviewClient};
pub use product::{InMemoryProductClient, ProductClient};
pub use recommendation::{InMemoryRecommendationClient, RecommendationClient};
pub use review::{InMemoryReviewClient, ReviewClient};
