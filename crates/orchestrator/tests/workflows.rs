//! Integration tests for the orchestration workflows against in-memory services.

use std::sync::Arc;
use std::time::Duration;

use clients::{
    AggregateEvents, CallCounts, InMemoryProductClient, InMemoryRecommendationClient,
    InMemoryReviewClient,
};
use domain::{
    AggregateBuilder, AggregateInput, EMPTY_RECOMMENDATIONS_WARNING, EMPTY_REVIEWS_WARNING,
    OrchestrationError, Product, ProductId, Recommendation, RecommendationSummary, Review,
    ReviewSummary,
};
use event_bus::{EventPublisher, EventType, InMemoryEventSink, PublisherConfig, Topic};
use orchestrator::Orchestrator;

type TestOrchestrator =
    Orchestrator<InMemoryProductClient, InMemoryReviewClient, InMemoryRecommendationClient>;

struct Fixture {
    product: InMemoryProductClient,
    review: InMemoryReviewClient,
    recommendation: InMemoryRecommendationClient,
    sink: InMemoryEventSink,
    publisher: Arc<EventPublisher>,
    orchestrator: TestOrchestrator,
}

fn fixture_with(config: PublisherConfig) -> Fixture {
    let product = InMemoryProductClient::new("product-1:8080");
    let review = InMemoryReviewClient::new("review-1:8080");
    let recommendation = InMemoryRecommendationClient::new("recommendation-1:8080");
    let sink = InMemoryEventSink::new();
    let publisher = Arc::new(EventPublisher::start(sink.clone(), config));

    let orchestrator = Orchestrator::new(
        product.clone(),
        review.clone(),
        recommendation.clone(),
        AggregateEvents::new(Arc::clone(&publisher)),
        AggregateBuilder::new("orchestration-1:7000"),
    );

    Fixture {
        product,
        review,
        recommendation,
        sink,
        publisher,
        orchestrator,
    }
}

fn fixture() -> Fixture {
    fixture_with(PublisherConfig::default())
}

fn id(raw: i64) -> ProductId {
    ProductId::new(raw).unwrap()
}

fn upstream(status: u16) -> OrchestrationError {
    OrchestrationError::Upstream {
        status,
        body: "boom".to_string(),
    }
}

fn input(product_id: i64, reviews: usize, recommendations: usize) -> AggregateInput {
    AggregateInput {
        product_id: Some(product_id),
        name: "Desk lamp".to_string(),
        weight: 3,
        review_summaries: (1..=reviews as i64)
            .map(|n| ReviewSummary {
                review_id: n,
                author: format!("author {n}"),
                subject: "subject".to_string(),
                content: "content".to_string(),
            })
            .collect(),
        recommendation_summaries: (1..=recommendations as i64)
            .map(|n| RecommendationSummary {
                recommendation_id: n,
                author: format!("author {n}"),
                rating: 4,
                content: "content".to_string(),
            })
            .collect(),
    }
}

fn seed(f: &Fixture, product_id: i64, reviews: i64, recommendations: i64) {
    f.product.insert(Product {
        product_id: id(product_id),
        name: "Desk lamp".to_string(),
        weight: 3,
        service_address: None,
    });
    for n in 1..=reviews {
        f.review.insert(Review {
            product_id: id(product_id),
            review_id: n,
            author: "a".to_string(),
            subject: "s".to_string(),
            content: "c".to_string(),
            service_address: None,
        });
    }
    for n in 1..=recommendations {
        f.recommendation.insert(Recommendation {
            product_id: id(product_id),
            recommendation_id: n,
            author: "a".to_string(),
            rating: 5,
            content: "c".to_string(),
            service_address: None,
        });
    }
}

fn no_calls(f: &Fixture) -> bool {
    f.product.calls() == CallCounts::default()
        && f.review.calls() == CallCounts::default()
        && f.recommendation.calls() == CallCounts::default()
}

// ---- read ----

#[tokio::test]
async fn test_get_full_aggregate() {
    let f = fixture();
    seed(&f, 1, 2, 3);

    let aggregate = f.orchestrator.get_aggregate(1).await.unwrap();

    assert_eq!(aggregate.product_id, id(1));
    assert_eq!(aggregate.review_summaries.len(), 2);
    assert_eq!(aggregate.recommendation_summaries.len(), 3);
    assert!(aggregate.warnings.is_empty());
    assert_eq!(
        aggregate.service_addresses.orchestration_address,
        "orchestration-1:7000"
    );
    assert_eq!(aggregate.service_addresses.product_address, "product-1:8080");
    assert_eq!(aggregate.service_addresses.review_address, "review-1:8080");
    assert_eq!(
        aggregate.service_addresses.recommendation_address,
        "recommendation-1:8080"
    );
}

#[tokio::test]
async fn test_get_non_positive_id_makes_no_calls() {
    let f = fixture();

    for raw in [0, -1] {
        let err = f.orchestrator.get_aggregate(raw).await.unwrap_err();
        assert_eq!(
            err,
            OrchestrationError::NotFound(format!("No product found for ID: {raw}"))
        );
    }
    assert!(no_calls(&f));
}

#[tokio::test]
async fn test_get_missing_product_is_not_found() {
    let f = fixture();
    seed(&f, 1, 1, 1);

    let err = f.orchestrator.get_aggregate(13).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_empty_dependents_produce_warnings() {
    let f = fixture();
    seed(&f, 1, 0, 0);

    let aggregate = f.orchestrator.get_aggregate(1).await.unwrap();

    assert!(aggregate.review_summaries.is_empty());
    assert!(aggregate.recommendation_summaries.is_empty());
    assert_eq!(
        aggregate.warnings,
        vec![EMPTY_REVIEWS_WARNING, EMPTY_RECOMMENDATIONS_WARNING]
    );
    assert_eq!(aggregate.service_addresses.review_address, "");
}

#[tokio::test]
async fn test_get_degrades_when_optional_dependency_fails() {
    let f = fixture();
    seed(&f, 1, 2, 2);
    f.recommendation.set_fail_on_get(Some(upstream(503)));

    let aggregate = f.orchestrator.get_aggregate(1).await.unwrap();

    assert_eq!(aggregate.review_summaries.len(), 2);
    assert!(aggregate.recommendation_summaries.is_empty());
    assert_eq!(aggregate.warnings, vec![EMPTY_RECOMMENDATIONS_WARNING]);
}

#[tokio::test]
async fn test_get_product_failure_is_fatal() {
    let f = fixture();
    seed(&f, 1, 1, 1);
    f.product.set_fail_on_get(Some(upstream(500)));

    let err = f.orchestrator.get_aggregate(1).await.unwrap_err();
    assert_eq!(err, upstream(500));
}

#[tokio::test(start_paused = true)]
async fn test_get_latency_is_bounded_by_slowest_dependency() {
    let f = fixture();
    seed(&f, 1, 1, 1);
    f.product.set_latency(Duration::from_millis(50));
    f.review.set_latency(Duration::from_millis(100));
    f.recommendation.set_latency(Duration::from_millis(150));

    let started = tokio::time::Instant::now();
    f.orchestrator.get_aggregate(1).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
}

// ---- synchronous create ----

#[tokio::test]
async fn test_create_aggregate() {
    let f = fixture();

    let aggregate = f.orchestrator.create_aggregate(input(1, 2, 1)).await.unwrap();

    assert_eq!(aggregate.product_id, id(1));
    assert_eq!(aggregate.review_summaries.len(), 2);
    assert_eq!(aggregate.recommendation_summaries.len(), 1);
    assert!(aggregate.warnings.is_empty());
    assert!(f.product.has_product(id(1)));
    assert_eq!(f.review.review_count(id(1)), 2);
    assert_eq!(f.recommendation.recommendation_count(id(1)), 1);
}

#[tokio::test]
async fn test_create_skips_empty_dependents() {
    let f = fixture();

    let aggregate = f.orchestrator.create_aggregate(input(1, 0, 0)).await.unwrap();

    assert_eq!(f.review.calls().create, 0);
    assert_eq!(f.recommendation.calls().create, 0);
    assert_eq!(
        aggregate.warnings,
        vec![EMPTY_REVIEWS_WARNING, EMPTY_RECOMMENDATIONS_WARNING]
    );
}

#[tokio::test]
async fn test_create_invalid_id_makes_no_calls() {
    let f = fixture();

    let missing = AggregateInput {
        product_id: None,
        ..input(1, 1, 1)
    };
    for bad in [missing, input(0, 1, 1), input(-5, 1, 1)] {
        let err = f.orchestrator.create_aggregate(bad).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::InvalidInput(_)));
    }
    assert!(no_calls(&f));
}

#[tokio::test]
async fn test_create_recommendation_failure_compensates_everything() {
    let f = fixture();
    f.recommendation.set_fail_on_create(Some(upstream(500)));

    let err = f
        .orchestrator
        .create_aggregate(input(7, 2, 2))
        .await
        .unwrap_err();

    assert_eq!(err, upstream(500));
    assert_eq!(f.product.calls().delete, 1);
    assert_eq!(f.review.calls().delete, 1);
    assert_eq!(f.recommendation.calls().delete, 1);
    assert!(!f.product.has_product(id(7)));
    assert_eq!(f.review.review_count(id(7)), 0);
}

#[tokio::test]
async fn test_create_both_dependents_fail_reports_review_error() {
    let f = fixture();
    f.review.set_fail_on_create(Some(upstream(502)));
    f.recommendation.set_fail_on_create(Some(upstream(500)));

    let err = f
        .orchestrator
        .create_aggregate(input(7, 1, 1))
        .await
        .unwrap_err();

    assert_eq!(err, upstream(502));
    // Compensation runs once, not once per failure
    assert_eq!(f.product.calls().delete, 1);
}

#[tokio::test]
async fn test_create_product_failure_is_not_compensated() {
    let f = fixture();
    f.product.set_fail_on_create(Some(upstream(503)));

    let err = f
        .orchestrator
        .create_aggregate(input(9, 1, 1))
        .await
        .unwrap_err();

    assert_eq!(err, upstream(503));
    assert_eq!(f.review.calls().create, 0);
    assert_eq!(f.product.calls().delete, 0);
    assert_eq!(f.review.calls().delete, 0);
    assert_eq!(f.recommendation.calls().delete, 0);
}

#[tokio::test]
async fn test_duplicate_create_leaves_existing_product_intact() {
    let f = fixture();
    seed(&f, 1, 1, 1);

    let err = f
        .orchestrator
        .create_aggregate(input(1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::InvalidInput(_)));

    assert_eq!(f.product.calls().delete, 0);
    assert!(f.product.has_product(id(1)));
    assert_eq!(f.review.review_count(id(1)), 1);
    let aggregate = f.orchestrator.get_aggregate(1).await.unwrap();
    assert_eq!(aggregate.review_summaries.len(), 1);
    assert_eq!(aggregate.recommendation_summaries.len(), 1);
}

#[tokio::test]
async fn test_compensation_failure_does_not_mask_original_error() {
    let f = fixture();
    f.review.set_fail_on_create(Some(upstream(500)));
    f.product.set_fail_on_delete(Some(upstream(503)));

    let err = f
        .orchestrator
        .create_aggregate(input(3, 1, 0))
        .await
        .unwrap_err();

    assert_eq!(err, upstream(500));
}

// ---- asynchronous create ----

#[tokio::test]
async fn test_create_async_publishes_product_first() {
    let f = fixture();

    let product_id = f
        .orchestrator
        .create_aggregate_async(input(4, 2, 1))
        .await
        .unwrap();
    assert_eq!(product_id, id(4));
    f.publisher.drain().await;

    let messages = f.sink.messages().await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].topic, Topic::Products);
    assert!(messages.iter().all(|m| m.event_type == EventType::Create));
    assert!(messages.iter().all(|m| m.partition_key == id(4)));
    assert_eq!(f.sink.messages_for(Topic::Reviews).await.len(), 2);
    assert_eq!(f.sink.messages_for(Topic::Recommendations).await.len(), 1);
    assert!(no_calls(&f));
}

#[tokio::test]
async fn test_create_async_rejected_create_publishes_nothing() {
    let f = fixture_with(PublisherConfig {
        workers: 1,
        queue_depth: 2,
    });
    f.sink.pause();

    let err = f
        .orchestrator
        .create_aggregate_async(input(4, 3, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Backpressure(_)));
    assert_eq!(f.publisher.in_flight(), 0);

    f.sink.resume();
    f.publisher.drain().await;
    assert_eq!(f.sink.message_count().await, 0);
}

#[tokio::test]
async fn test_create_async_rejection_leaves_room_for_other_writes() {
    let f = fixture_with(PublisherConfig {
        workers: 1,
        queue_depth: 3,
    });
    f.sink.pause();

    f.orchestrator
        .create_aggregate_async(input(5, 1, 0))
        .await
        .unwrap();
    let err = f
        .orchestrator
        .create_aggregate_async(input(6, 1, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Backpressure(_)));
    assert_eq!(f.publisher.in_flight(), 2);

    f.sink.resume();
    f.publisher.drain().await;
    let messages = f.sink.messages().await;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.partition_key == id(5)));
}

// ---- delete ----

#[tokio::test]
async fn test_delete_aggregate() {
    let f = fixture();
    seed(&f, 2, 2, 2);

    f.orchestrator.delete_aggregate(2).await.unwrap();

    assert!(!f.product.has_product(id(2)));
    assert_eq!(f.review.review_count(id(2)), 0);
    assert_eq!(f.recommendation.recommendation_count(id(2)), 0);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let f = fixture();
    seed(&f, 2, 1, 1);

    f.orchestrator.delete_aggregate(2).await.unwrap();
    f.orchestrator.delete_aggregate(2).await.unwrap();

    assert_eq!(f.product.calls().delete, 2);
}

#[tokio::test]
async fn test_delete_non_positive_id_makes_no_calls() {
    let f = fixture();

    let err = f.orchestrator.delete_aggregate(0).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(no_calls(&f));
}

#[tokio::test]
async fn test_delete_reports_dependency_failure() {
    let f = fixture();
    seed(&f, 2, 1, 1);
    f.review.set_fail_on_delete(Some(upstream(500)));

    let err = f.orchestrator.delete_aggregate(2).await.unwrap_err();

    assert_eq!(err, upstream(500));
    // The other deletes were not cancelled
    assert!(!f.product.has_product(id(2)));
    assert_eq!(f.recommendation.recommendation_count(id(2)), 0);
}

#[tokio::test]
async fn test_delete_async_publishes_to_every_topic() {
    let f = fixture();

    f.orchestrator.delete_aggregate_async(8).await.unwrap();
    f.publisher.drain().await;

    for topic in Topic::ALL {
        let messages = f.sink.messages_for(topic).await;
        assert_eq!(messages.len(), 1, "topic {topic}");
        assert_eq!(messages[0].event_type, EventType::Delete);
        assert_eq!(messages[0].partition_key, id(8));
    }
    assert!(no_calls(&f));
}
