//! Prometheus metrics
//!
//! Metric names:
//! - `realty_agent_requests_total{endpoint}`
//! - `realty_agent_errors_total{kind}`
//! - `realty_agent_pipeline_latency_ms{mode}` (recorded by the agent)
//! - `realty_agent_utterances_dispatched_total` (recorded by voice sessions)
//! - `realty_agent_sessions_active`

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Startup(format!("Failed to install metrics recorder: {}", e)))
}

pub fn record_request(endpoint: &'static str) {
    ::metrics::counter!("realty_agent_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_error(kind: &'static str) {
    ::metrics::counter!("realty_agent_errors_total", "kind" => kind).increment(1);
}

pub fn record_active_sessions(count: usize) {
    ::metrics::gauge!("realty_agent_sessions_active").set(count as f64);
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics are disabled".to_string(),
        ),
    }
}
