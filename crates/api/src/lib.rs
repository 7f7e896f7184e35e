//! HTTP API server for the product orchestration service.
//!
//! Exposes the composite product read/create/delete endpoints behind an optional
//! bearer-token authorization layer, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use clients::{
    AggregateEvents, Endpoint, HttpProductClient, HttpRecommendationClient, HttpReviewClient,
    InMemoryProductClient, InMemoryRecommendationClient, InMemoryReviewClient, ProductClient,
    RecommendationClient, ReviewClient,
};
use domain::AggregateBuilder;
use event_bus::EventPublisher;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::Orchestrator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::AuthState;
use config::{Config, WriteMode};
use routes::aggregates::AppState;

/// State of the production server, backed by the REST clients.
pub type HttpAppState = AppState<HttpProductClient, HttpReviewClient, HttpRecommendationClient>;

/// State backed by in-memory services.
pub type InMemoryAppState =
    AppState<InMemoryProductClient, InMemoryReviewClient, InMemoryRecommendationClient>;

/// Creates the Axum application router with all routes and shared state.
///
/// `auth` guards the product orchestration routes only; `/health` and
/// `/metrics` stay public.
pub fn create_app<P, R, C>(
    state: Arc<AppState<P, R, C>>,
    publisher: Arc<EventPublisher>,
    metrics_handle: PrometheusHandle,
    auth: Option<AuthState>,
) -> Router
where
    P: ProductClient + 'static,
    R: ReviewClient + 'static,
    C: RecommendationClient + 'static,
{
    let mut aggregates = Router::new()
        .route(
            "/product-orchestration",
            post(routes::aggregates::create::<P, R, C>),
        )
        .route(
            "/product-orchestration/{product_id}",
            get(routes::aggregates::get::<P, R, C>).delete(routes::aggregates::delete::<P, R, C>),
        )
        .with_state(state);

    if let Some(auth) = auth {
        aggregates = aggregates.layer(axum::middleware::from_fn_with_state(
            auth,
            auth::authorize,
        ));
    }

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .with_state(publisher)
        .merge(metrics_router)
        .merge(aggregates)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the production state: REST clients sharing one HTTP connection pool.
pub fn create_http_state(
    config: &Config,
    http: reqwest::Client,
    publisher: Arc<EventPublisher>,
) -> Arc<HttpAppState> {
    let orchestrator = Orchestrator::new(
        HttpProductClient::new(Endpoint::new(http.clone(), &config.product_service_url)),
        HttpReviewClient::new(Endpoint::new(http.clone(), &config.review_service_url)),
        HttpRecommendationClient::new(Endpoint::new(http, &config.recommendation_service_url)),
        AggregateEvents::new(publisher),
        AggregateBuilder::new(&config.service_address),
    );

    Arc::new(AppState {
        orchestrator,
        write_mode: config.write_mode,
    })
}

/// Handles on the in-memory services behind an [`InMemoryAppState`].
#[derive(Debug, Clone)]
pub struct InMemoryServices {
    pub product: InMemoryProductClient,
    pub review: InMemoryReviewClient,
    pub recommendation: InMemoryRecommendationClient,
}

/// Creates state backed by in-memory services, returning handles to seed and inspect them.
pub fn create_in_memory_state(
    publisher: Arc<EventPublisher>,
    write_mode: WriteMode,
) -> (Arc<InMemoryAppState>, InMemoryServices) {
    let services = InMemoryServices {
        product: InMemoryProductClient::new("product:8080"),
        review: InMemoryReviewClient::new("review:8080"),
        recommendation: InMemoryRecommendationClient::new("recommendation:8080"),
    };

    let orchestrator = Orchestrator::new(
        services.product.clone(),
        services.review.clone(),
        services.recommendation.clone(),
        AggregateEvents::new(publisher),
        AggregateBuilder::new("product-orchestration:7000"),
    );

    let state = Arc::new(AppState {
        orchestrator,
        write_mode,
    });
    (state, services)
}
