//! HTTP transport.
//!
//! Exactly one response per call: a processed payload with 200, or a generic
//! 500 when processing fails. The router owns retries; this process never
//! holds a request open.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde_json::json;

use crate::pipeline::Pipeline;
use crate::stages::StagePayload;

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new().route("/", post(handle)).with_state(pipeline)
}

async fn handle(
    State(pipeline): State<Arc<Pipeline>>,
    Json(payload): Json<StagePayload>,
) -> Response {
    let stage = payload.stage;
    let start = Instant::now();
    tracing::info!(monotonic_counter.coprocessor.requests = 1u64, %stage);

    let response = match pipeline.handle(payload).await {
        Ok(processed) => (StatusCode::OK, Json(processed)).into_response(),
        Err(error) => {
            tracing::error!(%stage, %error, "stage processing failed");
            tracing::info!(monotonic_counter.coprocessor.errors = 1u64, %stage);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    };

    tracing::info!(
        histogram.coprocessor.processing.duration = start.elapsed().as_secs_f64(),
        %stage
    );
    response
}
