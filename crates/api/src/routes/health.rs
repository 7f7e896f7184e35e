//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_bus::EventPublisher;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub events_in_flight: usize,
}

/// GET /health: liveness plus the number of events awaiting delivery.
pub async fn check(State(publisher): State<Arc<EventPublisher>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        events_in_flight: publisher.in_flight(),
    })
}
