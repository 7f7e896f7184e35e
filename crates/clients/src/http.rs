//! REST clients for the product, review and recommendation services.

use async_trait::async_trait;
use domain::{OrchestrationError, Product, ProductId, Recommendation, Result, Review};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::classify::{classify, transport_failure};
use crate::product::ProductClient;
use crate::recommendation::RecommendationClient;
use crate::review::ReviewClient;

/// Base URL of one downstream service plus the shared HTTP client.
#[derive(Debug, Clone)]
pub struct Endpoint {
    client: Client,
    base_url: String,
}

impl Endpoint {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn execute(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|e| transport_failure(&e))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("unreadable response body: {e}"));
    Err(classify(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|e| transport_failure(&e))?;
    serde_json::from_slice(&bytes).map_err(|e| OrchestrationError::Upstream {
        status,
        body: format!("invalid response body: {e}"),
    })
}

/// Product service over REST.
#[derive(Debug, Clone)]
pub struct HttpProductClient {
    endpoint: Endpoint,
}

impl HttpProductClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ProductClient for HttpProductClient {
    #[tracing::instrument(skip(self), fields(service = "product"))]
    async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        let url = self.endpoint.url(&format!("/product/{product_id}"));
        tracing::debug!(%url, "fetching product");
        let response = execute(self.endpoint.client.get(url)).await?;
        decode(response).await
    }

    #[tracing::instrument(skip_all, fields(service = "product", product_id = %product.product_id))]
    async fn create_product(&self, product: &Product) -> Result<Product> {
        let url = self.endpoint.url("/product");
        let response = execute(self.endpoint.client.post(url).json(product)).await?;
        decode(response).await
    }

    #[tracing::instrument(skip(self), fields(service = "product"))]
    async fn delete_product(&self, product_id: ProductId) -> Result<()> {
        let url = self.endpoint.url(&format!("/product/{product_id}"));
        execute(self.endpoint.client.delete(url)).await?;
        Ok(())
    }
}

/// Review service over REST.
#[derive(Debug, Clone)]
pub struct HttpReviewClient {
    endpoint: Endpoint,
}

impl HttpReviewClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ReviewClient for HttpReviewClient {
    #[tracing::instrument(skip(self), fields(service = "review"))]
    async fn get_reviews(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let request = self
            .endpoint
            .client
            .get(self.endpoint.url("/review"))
            .query(&[("productId", product_id.as_i64())]);
        decode(execute(request).await?).await
    }

    #[tracing::instrument(skip_all, fields(service = "review", count = reviews.len()))]
    async fn create_reviews(&self, reviews: &[Review]) -> Result<Vec<Review>> {
        let request = self
            .endpoint
            .client
            .post(self.endpoint.url("/review"))
            .json(reviews);
        decode(execute(request).await?).await
    }

    #[tracing::instrument(skip(self), fields(service = "review"))]
    async fn delete_reviews(&self, product_id: ProductId) -> Result<()> {
        let request = self
            .endpoint
            .client
            .delete(self.endpoint.url("/review"))
            .query(&[("productId", product_id.as_i64())]);
        execute(request).await?;
        Ok(())
    }
}

/// Recommendation service over REST.
#[derive(Debug, Clone)]
pub struct HttpRecommendationClient {
    endpoint: Endpoint,
}

impl HttpRecommendationClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl RecommendationClient for HttpRecommendationClient {
    #[tracing::instrument(skip(self), fields(service = "recommendation"))]
    async fn get_recommendations(&self, product_id: ProductId) -> Result<Vec<Recommendation>> {
        let request = self
            .endpoint
            .client
            .get(self.endpoint.url("/recommendation"))
            .query(&[("productId", product_id.as_i64())]);
        decode(execute(request).await?).await
    }

    #[tracing::instrument(
        skip_all,
        fields(service = "recommendation", count = recommendations.len())
    )]
    async fn create_recommendations(
        &self,
        recommendations: &[Recommendation],
    ) -> Result<Vec<Recommendation>> {
        let request = self
            .endpoint
            .client
            .post(self.endpoint.url("/recommendation"))
            .json(recommendations);
        decode(execute(request).await?).await
    }

    #[tracing::instrument(skip(self), fields(service = "recommendation"))]
    async fn delete_recommendations(&self, product_id: ProductId) -> Result<()> {
        let request = self
            .endpoint
            .client
            .delete(self.endpoint.url("/recommendation"))
            .query(&[("productId", product_id.as_i64())]);
        execute(request).await?;
        Ok(())
    }
}
