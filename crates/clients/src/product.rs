//! Product service client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{OrchestrationError, Product, ProductId, Result};

use crate::fault::{CallCounts, Faults, Op, simulate};

/// Operations on the product service.
#[async_trait]
pub trait ProductClient: Send + Sync {
    /// Fetches a product. Absence is reported as [`OrchestrationError::NotFound`].
    async fn get_product(&self, product_id: ProductId) -> Result<Product>;

    /// Creates a product and returns it as stored.
    async fn create_product(&self, product: &Product) -> Result<Product>;

    /// Deletes a product.
    async fn delete_product(&self, product_id: ProductId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryProductState {
    products: HashMap<ProductId, Product>,
    service_address: String,
    faults: Faults,
}

/// In-memory product service for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductClient {
    state: Arc<RwLock<InMemoryProductState>>,
}

impl InMemoryProductClient {
    /// Creates an empty product service answering as `service_address`.
    pub fn new(service_address: impl Into<String>) -> Self {
        let client = Self::default();
        client.state.write().unwrap().service_address = service_address.into();
        client
    }

    /// Stores a product directly, bypassing fault injection and call counting.
    pub fn insert(&self, product: Product) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product.product_id, product);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.write().unwrap().faults.latency = latency;
    }

    /// Makes every get fail with `error` until cleared with `None`.
    pub fn set_fail_on_get(&self, error: Option<OrchestrationError>) {
        self.state.write().unwrap().faults.fail_on_get = error;
    }

    /// Makes every create fail with `error` until cleared with `None`.
    pub fn set_fail_on_create(&self, error: Option<OrchestrationError>) {
        self.state.write().unwrap().faults.fail_on_create = error;
    }

    /// Makes every delete fail with `error` until cleared with `None`.
    pub fn set_fail_on_delete(&self, error: Option<OrchestrationError>) {
        self.state.write().unwrap().faults.fail_on_delete = error;
    }

    /// Returns the number of stored products.
    pub fn product_count(&self) -> usize {
        self.state.read().unwrap().products.len()
    }

    /// Returns true if a product is stored under `product_id`.
    pub fn has_product(&self, product_id: ProductId) -> bool {
        self.state.read().unwrap().products.contains_key(&product_id)
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
impl ProductClient for InMemoryProductClient {
    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        simulate(self.enter(Op::Get)).await;
        let state = self.state.read().unwrap();
        state.faults.check(Op::Get)?;

        let mut product = state.products.get(&product_id).cloned().ok_or_else(|| {
            OrchestrationError::NotFound(format!("No product found for productId: {product_id}"))
        })?;
        product.service_address = Some(state.service_address.clone());
        Ok(product)
    }

    async fn create_product(&self, product: &Product) -> Result<Product> {
        simulate(self.enter(Op::Create)).await;
        let mut state = self.state.write().unwrap();
        state.faults.check(Op::Create)?;

        if state.products.contains_key(&product.product_id) {
            return Err(OrchestrationError::InvalidInput(format!(
                "Duplicate key, Product Id: {}",
                product.product_id
            )));
        }

        let mut stored = product.clone();
        stored.service_address = Some(state.service_address.clone());
        state.products.insert(stored.product_id, stored.clone());
        Ok(stored)
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<()> {
        simulate(self.enter(Op::Delete)).await;
        let mut state = self.state.write().unwrap();
        state.faults.check(Op::Delete)?;

        state
            .products
            .remove(&product_id)
            .map(|_| ())
            .ok_or_else(|| {
                OrchestrationError::NotFound(format!(
                    "No product found for productId: {product_id}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64) -> Product {
        Product {
            product_id: ProductId::new(id).unwrap(),
            name: format!("product {id}"),
            weight: 10,
            service_address: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let client = InMemoryProductClient::new("product-1:8080");
        let id = ProductId::new(1).unwrap();

        let stored = client.create_product(&product(1)).await.unwrap();
        assert_eq!(stored.service_address.as_deref(), Some("product-1:8080"));
        assert!(client.has_product(id));

        let fetched = client.get_product(id).await.unwrap();
        assert_eq!(fetched.name, "product 1");

        client.delete_product(id).await.unwrap();
        assert_eq!(client.product_count(), 0);
        assert_eq!(
            client.calls(),
            CallCounts {
                get: 1,
                create: 1,
                delete: 1
            }
        );
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let client = InMemoryProductClient::new("product-1:8080");
        let id = ProductId::new(13).unwrap();

        let err = client.get_product(id).await.unwrap_err();
        assert!(err.is_not_found());
        let err = client.delete_product(id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_invalid_input() {
        let client = InMemoryProductClient::new("product-1:8080");
        client.insert(product(2));

        let err = client.create_product(&product(2)).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidInput(_)));
        assert_eq!(client.product_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_counted() {
        let client = InMemoryProductClient::new("product-1:8080");
        client.set_fail_on_create(Some(OrchestrationError::Upstream {
            status: 500,
            body: "down".to_string(),
        }));

        assert!(client.create_product(&product(3)).await.is_err());
        assert_eq!(client.calls().create, 1);
        assert_eq!(client.product_count(), 0);

        client.set_fail_on_create(None);
        assert!(client.create_product(&product(3)).await.is_ok());
    }
}
