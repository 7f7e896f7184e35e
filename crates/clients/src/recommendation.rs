//! Recommendation service client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{OrchestrationError, ProductId, Recommendation, Result};

use crate::fault::{CallCounts, Faults, Op, simulate};

/// Operations on the recommendation service.
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    async fn get_recommendations(&self, product_id: ProductId) -> Result<Vec<Recommendation>>;

    async fn create_recommendations(
        &self,
        recommendations: &[Recommendation],
    ) -> Result<Vec<Recommendation>>;

    async fn delete_recommendations(&self, product_id: ProductId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryRecommendationState {
    recommendations: HashMap<ProductId, Vec<Recommendation>>,
    service_address: String,
    faults: Faults,
}

/// In-memory recommendation service for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecommendationClient {
    state: Arc<RwLock<InMemoryRecommendationState>>,
}

impl InMemoryRecommendationClient {
    pub fn new(service_address: impl Into<String>) -> Self {
        let client = Self::default();
        client.state.write().unwrap().service_address = service_address.into();
        client
    }

    pub fn insert(&self, recommendation: Recommendation) {
        self.state
            .write()
            .unwrap()
            .recommendations
            .entry(recommendation.product_id)
            .or_default()
            .push(recommendation);
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

    pub fn recommendation_count(&self, product_id: ProductId) -> usize {
        self.state
            .read()
            .unwrap()
            .recommendations
            .get(&product_id)
            .map_or(0, Vec::len)
    }

    pub fn calls(&self) -> CallCounts {
        self.state.read().unwrap().faults.calls
    }

    fn enter(&self, op: Op) -> Duration {
        self.state.write().unwrap().faults.enter(op)
    }
}

#[async_trait]
impl RecommendationClient for InMemoryRecommendationClient {
    async fn get_recommendations(&self, product_id: ProductId) -> Result<Vec<Recommendation>> {
        simulate(self.enter(Op::Get)).await;
        let state = self.state.read().unwrap();
        state.faults.check(Op::Get)?;

        let address = &state.service_address;
        Ok(state
            .recommendations
            .get(&product_id)
            .into_iter()
            .flatten()
            .cloned()
            .map(|mut r| {
                r.service_address = Some(address.clone());
                r
            })
            .collect())
    }

    async fn create_recommendations(
        &self,
        recommendations: &[Recommendation],
    ) -> Result<Vec<Recommendation>> {
        simulate(self.enter(Op::Create)).await;
        let mut state = self.state.write().unwrap();
        state.faults.check(Op::Create)?;

        if let Some(dup) = recommendations.iter().find(|rec| {
            state
                .recommendations
                .get(&rec.product_id)
                .is_some_and(|stored| {
                    stored
                        .iter()
                        .any(|r| r.recommendation_id == rec.recommendation_id)
                })
        }) {
            return Err(OrchestrationError::InvalidInput(format!(
                "Duplicate key, Product Id: {}, Recommendation Id: {}",
                dup.product_id, dup.recommendation_id
            )));
        }

        let mut stored = Vec::with_capacity(recommendations.len());
        for rec in recommendations {
            let mut rec = rec.clone();
            rec.service_address = Some(state.service_address.clone());
            state
                .recommendations
                .entry(rec.product_id)
                .or_default()
                .push(rec.clone());
            stored.push(rec);
        }
        Ok(stored)
    }

    async fn delete_recommendations(&self, product_id: ProductId) -> Result<()> {
        simulate(self.enter(Op::Delete)).await;
        let mut state = self.state.write().unwrap();
        state.faults.check(Op::Delete)?;

        state.recommendations.remove(&product_id);
        Ok(())
    }
}
