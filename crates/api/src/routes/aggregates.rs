//! Composite product endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clients::{ProductClient, RecommendationClient, ReviewClient};
use domain::{AggregateInput, ProductAggregate};
use orchestrator::Orchestrator;
use serde::Serialize;

use crate::config::WriteMode;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<P, R, C>
where
    P: ProductClient,
    R: ReviewClient,
    C: RecommendationClient,
{
    pub orchestrator: Orchestrator<P, R, C>,
    pub write_mode: WriteMode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAcceptedResponse {
    pub product_id: i64,
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Type mismatch: {raw} is not a product id")))
}

/// GET /product-orchestration/{product_id}: the composite view of a product.
pub async fn get<P, R, C>(
    State(state): State<Arc<AppState<P, R, C>>>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductAggregate>, ApiError>
where
    P: ProductClient + 'static,
    R: ReviewClient + 'static,
    C: RecommendationClient + 'static,
{
    let product_id = parse_id(&product_id)?;
    let aggregate = state.orchestrator.get_aggregate(product_id).await?;
    Ok(Json(aggregate))
}

/// POST /product-orchestration: creates a product with its reviews and recommendations.
///
/// Answers 201 with the aggregate in sync mode, 202 with the product id in async mode.
pub async fn create<P, R, C>(
    State(state): State<Arc<AppState<P, R, C>>>,
    body: Result<Json<AggregateInput>, JsonRejection>,
) -> Result<Response, ApiError>
where
    P: ProductClient + 'static,
    R: ReviewClient + 'static,
    C: RecommendationClient + 'static,
{
    let Json(input) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    match state.write_mode {
        WriteMode::Sync => {
            let aggregate = state.orchestrator.create_aggregate(input).await?;
            Ok((StatusCode::CREATED, Json(aggregate)).into_response())
        }
        WriteMode::Async => {
            let product_id = state.orchestrator.create_aggregate_async(input).await?;
            let body = CreateAcceptedResponse {
                product_id: product_id.as_i64(),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

/// DELETE /product-orchestration/{product_id}: removes the product everywhere.
pub async fn delete<P, R, C>(
    State(state): State<Arc<AppState<P, R, C>>>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    P: ProductClient + 'static,
    R: ReviewClient + 'static,
    C: RecommendationClient + 'static,
{
    let product_id = parse_id(&product_id)?;
    match state.write_mode {
        WriteMode::Sync => {
            state.orchestrator.delete_aggregate(product_id).await?;
            Ok(StatusCode::OK)
        }
        WriteMode::Async => {
            state.orchestrator.delete_aggregate_async(product_id).await?;
            Ok(StatusCode::ACCEPTED)
        }
    }
}
