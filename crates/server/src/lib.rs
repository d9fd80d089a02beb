//! Real-estate agent server
//!
//! Provides HTTP and WebSocket endpoints for the agent, plus the shared
//! start-up code used by the server and terminal binaries.

pub mod bootstrap;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod state;
pub mod websocket;

pub use bootstrap::{build_components, warm_up_llm, Components};
pub use http::create_router;
pub use logging::{init_cli_tracing, init_tracing};
pub use self::metrics::{init_metrics, record_error, record_request};
pub use session::{SessionManager, SessionSummary};
pub use state::{AppState, SpeechServices};
pub use websocket::{WebSocketHandler, WsMessage};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use realty_agent_agent::AgentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session limit reached ({0})")]
    SessionLimit(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    fn kind(&self) -> &'static str {
        match self {
            ServerError::SessionNotFound(_) => "session_not_found",
            ServerError::SessionLimit(_) => "session_limit",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Upstream(_) => "upstream",
            ServerError::Unavailable(_) => "unavailable",
            ServerError::Startup(_) => "startup",
            ServerError::Internal(_) => "internal",
        }
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Startup(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        record_error(self.kind());
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Conversation(msg) => ServerError::InvalidRequest(msg),
            err if err.is_upstream() => ServerError::Upstream(err.to_string()),
            err => ServerError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_errors_map_to_status() {
        let err: ServerError = AgentError::Llm("HTTP 429".into()).into();
        assert_eq!(StatusCode::from(&err), StatusCode::BAD_GATEWAY);

        let err: ServerError = AgentError::Conversation("Empty message".into()).into();
        assert_eq!(StatusCode::from(&err), StatusCode::BAD_REQUEST);

        let err: ServerError = AgentError::Pipeline("join".into()).into();
        assert_eq!(StatusCode::from(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
