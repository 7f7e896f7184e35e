//! Review service client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{OrchestrationError, ProductId, Result, Review};

use crate::fault::{CallCounts, Faults, Op, simulate};

/// Operations on the review service.
#[async_trait]
pub trait ReviewClient: Send + Sync {
    /// Lists the reviews of a product. A product without reviews yields an empty list.
    async fn get_reviews(&self, product_id: ProductId) -> Result<Vec<Review>>;

    /// Creates reviews and returns them as stored.
    async fn create_reviews(&self, reviews: &[Review]) -> Result<Vec<Review>>;

    /// Deletes every review of a product.
    async fn delete_reviews(&self, product_id: ProductId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryReviewState {
    reviews: HashMap<ProductId, Vec<Review>>,
    service_address: String,
    faults: Faults,
}

/// In-memory review service for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReviewClient {
    state: Arc<RwLock<InMemoryReviewState>>,
}

impl InMemoryReviewClient {
    /// Creates an empty review service answering as `service_address`.
    pub fn new(service_address: impl Into<String>) -> Self {
        let client = Self::default();
        client.state.write().unwrap().service_address = service_address.into();
        client
    }

    /// Stores a review directly, bypassing fault injection and call counting.
    pub fn insert(&self, review: Review) {
        self.state
            .write()
            .unwrap()
            .reviews
            .entry(review.product_id)
            .or_default()
            .push(review);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.state.write().unwrap().faults.latency = latency;
    }

    pub fn set_fail_on_get(&self, error: Option<OrchestrationError>) {
        self.state.write().unwrap().faults.fail_on_get = error;
    }

    pub fn set_fail_on_create(&self, error: Option<OrchestrationError>) {
        self.state.write().unwrap().faults.fail_on_create = error;
    }

    pub fn set_fail_on_delete(&self, error: Option<OrchestrationError>) {
        self.state.write().unwrap().faults.fail_on_delete = error;
    }

    /// Returns the number of reviews stored for `product_id`.
    pub fn review_count(&self, product_id: ProductId) -> usize {
        self.state
            .read()
            .unwrap()
            .reviews
            .get(&product_id)
            .map_or(0, Vec::len)
    }

    /// Returns the calls served so far.
    pub fn calls(&self) -> CallCounts {
        self.state.read().unwrap().faults.calls
    }

    fn enter(&self, op: Op) -> Duration {
        self.state.write().unwrap().faults.enter(op)
    }
}

#[async_trait]
impl ReviewClient for InMemoryReviewClient {
    async fn get_reviews(&self, product_id: ProductId) -> Result<Vec<Review>> {
        simulate(self.enter(Op::Get)).await;
        let state = self.state.read().unwrap();
        state.faults.check(Op::Get)?;

        let reviews = state
            .reviews
            .get(&product_id)
            .map(|reviews| {
                reviews
                    .iter()
                    .cloned()
                    .map(|mut r| {
                        r.service_address = Some(state.service_address.clone());
                        r
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(reviews)
    }

    async fn create_reviews(&self, reviews: &[Review]) -> Result<Vec<Review>> {
        simulate(self.enter(Op::Create)).await;
        let mut state = self.state.write().unwrap();
        state.faults.check(Op::Create)?;

        for review in reviews {
            let exists = state
                .reviews
                .get(&review.product_id)
                .is_some_and(|stored| stored.iter().any(|r| r.review_id == review.review_id));
            if exists {
                return Err(OrchestrationError::InvalidInput(format!(
                    "Duplicate key, Product Id: {}, Review Id: {}",
                    review.product_id, review.review_id
                )));
            }
        }

        let address = state.service_address.clone();
        let stored: Vec<Review> = reviews
            .iter()
            .cloned()
            .map(|mut r| {
                r.service_address = Some(address.clone());
                r
            })
            .collect();
        for review in &stored {
            state
                .reviews
                .entry(review.product_id)
                .or_default()
                .push(review.clone());
        }
        Ok(stored)
    }

    async fn delete_reviews(&self, product_id: ProductId) -> Result<()> {
        simulate(self.enter(Op::Delete)).await;
        let mut state = self.state.write().unwrap();
        state.faults.check(Op::Delete)?;

        state.reviews.remove(&product_id);
        Ok(())
    }
}
