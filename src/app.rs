//! Axum router and handlers implementing the execution endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use flow_core::store::DurableStore;
use flow_core::{FlowExecutionEngine, LogSink};
use serde::Serialize;
use serde_json::Value;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::errors::ApiError;

const RECENT_LOGS_LIMIT: i64 = 100;

/// Parses a non-GET request body as JSON per §4.B: an empty body yields an
/// empty map rather than an error (a caller with no flow inputs to pass
/// still needs to be able to POST with no body at all).
fn body_to_inputs(bytes: Bytes) -> Result<HashMap<String, Value>, ApiError> {
    if bytes.is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError(flow_core::errors::EngineError::Internal(format!("invalid JSON body: {err}"))))
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FlowExecutionEngine>,
    pub store: Arc<dyn DurableStore>,
    pub log_sink: Arc<LogSink>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/execute/:slug", get(execute_get).post(execute_post))
        .route("/api/execute/:slug/test", post(execute_test))
        .route("/api/execute/:slug/logs", get(execute_logs))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(120)))
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "up",
        "logSinkDropped": state.log_sink.dropped_count(),
    }))
}

#[derive(Serialize)]
struct SuccessEnvelope<T> {
    success: bool,
    data: T,
}

/// Query values are tried as JSON first, falling back to the raw string.
fn query_to_inputs(query: HashMap<String, String>) -> HashMap<String, Value> {
    query.into_iter().map(|(k, v)| (k.clone(), serde_json::from_str(&v).unwrap_or(Value::String(v)))).collect()
}

async fn execute_get(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let inputs = query_to_inputs(query);
    run_execution(&state, &slug, inputs, false).await
}

async fn execute_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let body = body_to_inputs(bytes)?;
    run_execution(&state, &slug, body, false).await
}

async fn execute_test(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let body = body_to_inputs(bytes)?;
    run_execution(&state, &slug, body, true).await
}

async fn run_execution(state: &AppState, slug: &str, inputs: HashMap<String, Value>, is_test: bool) -> Result<impl IntoResponse, ApiError> {
    let span = tracing::info_span!("flow_execution", flow_slug = slug, is_test);
    async move {
        let outcome = if is_test { state.engine.execute_test(slug, inputs).await } else { state.engine.execute(slug, inputs).await };
        let outcome = outcome?;
        Ok(Json(SuccessEnvelope { success: true, data: outcome.output }))
    }
    .instrument(span)
    .await
}

async fn execute_logs(State(state): State<AppState>, Path(slug): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let logs = state.store.recent_logs(&slug, RECENT_LOGS_LIMIT).await?;
    Ok(Json(SuccessEnvelope { success: true, data: logs }))
}
