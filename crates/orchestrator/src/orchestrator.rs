//! The product orchestrator: composite reads and compensated writes.

use std::time::Instant;

use clients::{AggregateEvents, ProductClient, RecommendationClient, ReviewClient};
use common::WorkflowId;
use domain::{
    AggregateBuilder, AggregateInput, OrchestrationError, Product, ProductAggregate, ProductId,
    Recommendation, Result, Review,
};
use futures_util::future::{join, join3};

use crate::steps;

/// Composes the product, review and recommendation services into one aggregate.
///
/// Reads fan out to the three services concurrently; only the product is
/// mandatory. Writes create the product first and the dependents concurrently.
/// A failure after the product exists runs a best-effort compensation that
/// deletes the product id on all three services. A failed product create is
/// returned as is, since nothing was created and the id may belong to an
/// existing product.
pub struct Orchestrator<P, R, C>
where
    P: ProductClient,
    R: ReviewClient,
    C: RecommendationClient,
{
    product: P,
    review: R,
    recommendation: C,
    events: AggregateEvents,
    builder: AggregateBuilder,
}

impl<P, R, C> Orchestrator<P, R, C>
where
    P: ProductClient,
    R: ReviewClient,
    C: RecommendationClient,
{
    /// Creates a new orchestrator.
    pub fn new(
        product: P,
        review: R,
        recommendation: C,
        events: AggregateEvents,
        builder: AggregateBuilder,
    ) -> Self {
        Self {
            product,
            review,
            recommendation,
            events,
            builder,
        }
    }

    /// Reads the composite view of a product.
    ///
    /// A failing or empty review/recommendation branch degrades to an empty list
    /// with a warning. A product failure is returned as is.
    #[tracing::instrument(skip(self))]
    pub async fn get_aggregate(&self, product_id: i64) -> Result<ProductAggregate> {
        let product_id = existing_product(product_id)?;
        metrics::counter!("orchestration_reads_total").increment(1);
        let started = Instant::now();
        tracing::debug!(%product_id, "reading composite product");

        let (product, reviews, recommendations) = join3(
            self.product.get_product(product_id),
            self.review.get_reviews(product_id),
            self.recommendation.get_recommendations(product_id),
        )
        .await;

        let product = product.inspect_err(|e| {
            tracing::debug!(step = steps::GET_PRODUCT, error = %e, "product lookup failed");
        })?;
        let reviews = optional(steps::GET_REVIEWS, reviews);
        let recommendations = optional(steps::GET_RECOMMENDATIONS, recommendations);

        let aggregate = self.builder.build(&product, &reviews, &recommendations);
        metrics::histogram!("orchestration_read_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(aggregate)
    }

    /// Creates the product and its dependents, waiting for each service.
    ///
    /// If a dependent create fails, every service is asked to delete the product
    /// id before the original error is returned. When both dependent creates
    /// fail, the review error is reported.
    #[tracing::instrument(
        skip_all,
        fields(workflow_id = %WorkflowId::new(), product_id = ?input.product_id)
    )]
    pub async fn create_aggregate(&self, input: AggregateInput) -> Result<ProductAggregate> {
        let product_id = requested_product(&input)?;
        metrics::counter!("orchestration_creates_total", "mode" => "sync").increment(1);

        tracing::info!(step = steps::CREATE_PRODUCT, "workflow step started");
        let product = match self
            .product
            .create_product(&Product::from_input(&input, product_id))
            .await
        {
            Ok(product) => product,
            Err(e) => {
                record_failure(product_id, steps::CREATE_PRODUCT, &e);
                return Err(e);
            }
        };

        let reviews = review_records(&input, product.product_id);
        let recommendations = recommendation_records(&input, product.product_id);

        tracing::info!(
            reviews = reviews.len(),
            recommendations = recommendations.len(),
            "creating dependents"
        );
        let (reviews, recommendations) = join(
            self.create_reviews(&reviews),
            self.create_recommendations(&recommendations),
        )
        .await;

        let reviews = match reviews {
            Ok(reviews) => reviews,
            Err(e) => return Err(self.abort(product_id, steps::CREATE_REVIEWS, e).await),
        };
        let recommendations = match recommendations {
            Ok(recommendations) => recommendations,
            Err(e) => {
                return Err(self
                    .abort(product_id, steps::CREATE_RECOMMENDATIONS, e)
                    .await);
            }
        };

        tracing::info!(%product_id, "composite product created");
        Ok(self.builder.build(&product, &reviews, &recommendations))
    }

    /// Publishes CREATE events for the product and its dependents.
    ///
    /// Returns once every event is accepted for delivery. The events form one
    /// batch with the product first, so a rejection normally means none was
    /// accepted. Only when part of the batch got through are DELETE events
    /// published on every topic.
    #[tracing::instrument(
        skip_all,
        fields(workflow_id = %WorkflowId::new(), product_id = ?input.product_id)
    )]
    pub async fn create_aggregate_async(&self, input: AggregateInput) -> Result<ProductId> {
        let product_id = requested_product(&input)?;
        metrics::counter!("orchestration_creates_total", "mode" => "async").increment(1);

        let product = Product::from_input(&input, product_id);
        let reviews = review_records(&input, product_id);
        let recommendations = recommendation_records(&input, product_id);

        if let Err(rejected) = self
            .events
            .publish_creates(&product, &reviews, &recommendations)
        {
            record_failure(product_id, steps::PUBLISH_CREATES, &rejected.error);
            if rejected.accepted > 0 {
                tracing::warn!(accepted = rejected.accepted, "create partially accepted");
                self.compensate_async(product_id);
            }
            return Err(rejected.error);
        }

        tracing::info!(%product_id, "composite product create accepted");
        Ok(product_id)
    }

    /// Deletes the product and its dependents on all three services.
    ///
    /// Already-absent data is not an error, so repeating a delete succeeds.
    #[tracing::instrument(skip(self), fields(workflow_id = %WorkflowId::new()))]
    pub async fn delete_aggregate(&self, product_id: i64) -> Result<()> {
        let product_id = existing_product(product_id)?;
        metrics::counter!("orchestration_deletes_total", "mode" => "sync").increment(1);

        let (product, reviews, recommendations) = join3(
            self.product.delete_product(product_id),
            self.review.delete_reviews(product_id),
            self.recommendation.delete_recommendations(product_id),
        )
        .await;

        absent_is_deleted(product)?;
        absent_is_deleted(reviews)?;
        absent_is_deleted(recommendations)?;

        tracing::info!(%product_id, "composite product deleted");
        Ok(())
    }

    /// Publishes DELETE events on the three topics.
    #[tracing::instrument(skip(self), fields(workflow_id = %WorkflowId::new()))]
    pub async fn delete_aggregate_async(&self, product_id: i64) -> Result<()> {
        let product_id = existing_product(product_id)?;
        metrics::counter!("orchestration_deletes_total", "mode" => "async").increment(1);

        self.events.products.publish_delete(product_id)?;
        self.events.reviews.publish_delete(product_id)?;
        self.events.recommendations.publish_delete(product_id)?;

        tracing::info!(%product_id, "composite product delete accepted");
        Ok(())
    }

    async fn create_reviews(&self, reviews: &[Review]) -> Result<Vec<Review>> {
        if reviews.is_empty() {
            return Ok(Vec::new());
        }
        self.review.create_reviews(reviews).await
    }

    async fn create_recommendations(
        &self,
        recommendations: &[Recommendation],
    ) -> Result<Vec<Recommendation>> {
        if recommendations.is_empty() {
            return Ok(Vec::new());
        }
        self.recommendation
            .create_recommendations(recommendations)
            .await
    }

    /// Records the failed step, compensates and hands the error back.
    async fn abort(
        &self,
        product_id: ProductId,
        step: &'static str,
        error: OrchestrationError,
    ) -> OrchestrationError {
        record_failure(product_id, step, &error);
        self.compensate(product_id).await;
        error
    }

    /// Deletes the product id on all three services. Failures are logged and counted only.
    #[tracing::instrument(skip(self))]
    async fn compensate(&self, product_id: ProductId) {
        metrics::counter!("orchestration_compensations_total", "mode" => "sync").increment(1);

        let (product, reviews, recommendations) = join3(
            self.product.delete_product(product_id),
            self.review.delete_reviews(product_id),
            self.recommendation.delete_recommendations(product_id),
        )
        .await;

        for (step, result) in [
            (steps::DELETE_PRODUCT, product),
            (steps::DELETE_REVIEWS, reviews),
            (steps::DELETE_RECOMMENDATIONS, recommendations),
        ] {
            match result {
                Ok(()) => tracing::debug!(step, "compensation step completed"),
                // Nothing had been created there
                Err(e) if e.is_not_found() => tracing::debug!(step, "nothing to compensate"),
                Err(e) => compensation_failed(product_id, step, &e),
            }
        }
        tracing::info!(%product_id, "compensation finished");
    }

    fn compensate_async(&self, product_id: ProductId) {
        metrics::counter!("orchestration_compensations_total", "mode" => "async").increment(1);

        for (step, result) in [
            (
                steps::DELETE_PRODUCT,
                self.events.products.publish_delete(product_id),
            ),
            (
                steps::DELETE_REVIEWS,
                self.events.reviews.publish_delete(product_id),
            ),
            (
                steps::DELETE_RECOMMENDATIONS,
                self.events.recommendations.publish_delete(product_id),
            ),
        ] {
            if let Err(e) = result {
                compensation_failed(product_id, step, &e);
            }
        }
    }
}

/// Validates a path id for reads and deletes. A non-positive id cannot exist.
fn existing_product(raw: i64) -> Result<ProductId> {
    ProductId::new(raw)
        .map_err(|_| OrchestrationError::NotFound(format!("No product found for ID: {raw}")))
}

/// Validates the id of a create request.
fn requested_product(input: &AggregateInput) -> Result<ProductId> {
    let raw = input
        .product_id
        .ok_or_else(|| OrchestrationError::InvalidInput("productId is required".to_string()))?;
    ProductId::new(raw).map_err(|e| OrchestrationError::InvalidInput(e.to_string()))
}

fn review_records(input: &AggregateInput, product_id: ProductId) -> Vec<Review> {
    input
        .review_summaries
        .iter()
        .map(|summary| Review::from_summary(summary, product_id))
        .collect()
}

fn recommendation_records(input: &AggregateInput, product_id: ProductId) -> Vec<Recommendation> {
    input
        .recommendation_summaries
        .iter()
        .map(|summary| Recommendation::from_summary(summary, product_id))
        .collect()
}

fn optional<T>(step: &'static str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::debug!(step, error = %e, "optional dependency failed, continuing without it");
        Vec::new()
    })
}

fn absent_is_deleted(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

fn record_failure(product_id: ProductId, step: &'static str, error: &OrchestrationError) {
    metrics::counter!(
        "orchestration_create_failures_total",
        "step" => step,
        "kind" => error.kind()
    )
    .increment(1);
    tracing::warn!(%product_id, step, error = %error, "create failed");
}

fn compensation_failed(product_id: ProductId, step: &'static str, error: &OrchestrationError) {
    metrics::counter!("orchestration_compensation_failures_total", "step" => step).increment(1);
    tracing::warn!(%product_id, step, error = %error, "compensation step failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_product_rejects_non_positive() {
        for raw in [0, -1, i64::MIN] {
            let err = existing_product(raw).unwrap_err();
            assert_eq!(
                err,
                OrchestrationError::NotFound(format!("No product found for ID: {raw}"))
            );
        }
        assert_eq!(existing_product(3).unwrap().as_i64(), 3);
    }

    #[test]
    fn test_requested_product_requires_positive_id() {
        let missing = AggregateInput::default();
        assert!(matches!(
            requested_product(&missing),
            Err(OrchestrationError::InvalidInput(_))
        ));

        let negative = AggregateInput {
            product_id: Some(-4),
            ..Default::default()
        };
        assert!(matches!(
            requested_product(&negative),
            Err(OrchestrationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_absent_is_deleted() {
        assert!(absent_is_deleted(Err(OrchestrationError::NotFound("x".to_string()))).is_ok());
        assert!(
            absent_is_deleted(Err(OrchestrationError::Backpressure("full".to_string()))).is_err()
        );
    }
}
