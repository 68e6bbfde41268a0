//! HTTP routes and handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use wattprint_core::{ConversationBatch, Error};
use wattprint_telemetry::{metrics as metric_names, SinkRecord};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .route("/v1/estimate", post(estimate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Estimate sustainability metrics for a batch of conversations.
///
/// Body: `{ "<conversation-id>": {server_ip, queries: [{query, model?,
/// duration?}], model?} }`. Validation failure rejects the whole batch;
/// everything else degrades inside the pipeline.
async fn estimate(
    State(state): State<AppState>,
    Json(batch): Json<ConversationBatch>,
) -> Response {
    metrics::counter!(metric_names::REQUESTS_TOTAL).increment(1);

    match state.pipeline.process_batch(&batch).await {
        Ok(reports) => {
            for (id, report) in &reports {
                let record = SinkRecord {
                    conversation_id: id.clone(),
                    energy: report.metrics.energy_kwh,
                    water: report.metrics.water_l,
                    carbon: report.metrics.carbon_kg,
                };
                // Sink trouble must not fail a served estimate
                if let Err(err) = state.sink.store(&record).await {
                    error!(conversation = %id, error = %err, "failed to persist metrics");
                }
            }
            (StatusCode::OK, Json(reports)).into_response()
        }
        Err(err @ Error::InvalidInput(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "estimation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}
