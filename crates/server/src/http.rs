//! HTTP Endpoints
//!
//! REST API for the agent.

use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use realty_agent_core::{ConversationTurn, PipelineResult, ResponseMode};

use crate::metrics::{metrics_handler, record_request};
use crate::state::AppState;
use crate::websocket::WebSocketHandler;
use crate::ServerError;

const READY_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    let api = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/chat/:session_id", post(session_chat))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        // Upgraded sockets outlive any request timeout
        .layer(TimeoutLayer::new(timeout));

    api.route("/ws/:session_id", get(WebSocketHandler::handle))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, any origin is allowed without credentials
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, allowing any origin");
        }
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!(origins = parsed_origins.len(), "CORS configured");
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        // wildcard headers are rejected alongside credentials
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Stateless chat request: the caller owns the history
#[derive(Debug, Deserialize)]
struct ChatRequest {
    history: Vec<ConversationTurn>,
    #[serde(default)]
    voice_mode: bool,
}

/// Stateless chat endpoint
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<PipelineResult>, ServerError> {
    record_request("chat");
    let mode = ResponseMode::from_voice_flag(request.voice_mode);
    let result = state.responder.respond(&request.history, mode).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct CreatedSession {
    session_id: String,
    websocket_url: String,
    voice_enabled: bool,
}

/// Create session
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreatedSession>), ServerError> {
    record_request("create_session");
    let session = state.sessions.create()?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedSession {
            session_id: session.id().to_string(),
            websocket_url: format!("/ws/{}", session.id()),
            voice_enabled: state.voice_enabled(),
        }),
    ))
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    record_request("list_sessions");
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// Get session info with its history
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    record_request("get_session");
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;

    let history = session.history().snapshot();
    Ok(Json(serde_json::json!({
        "session_id": session.id(),
        "created_at": session.created_at(),
        "idle_secs": session.idle_for().as_secs(),
        "turn_count": history.len(),
        "history": history,
    })))
}

/// Delete session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    record_request("delete_session");
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::SessionNotFound(id))
    }
}

/// Session chat request
#[derive(Debug, Deserialize)]
struct SessionChatRequest {
    message: String,
    #[serde(default)]
    voice_mode: bool,
}

/// Chat within a session; the session keeps the history
async fn session_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SessionChatRequest>,
) -> Result<Json<PipelineResult>, ServerError> {
    record_request("session_chat");
    let session = state
        .sessions
        .get(&session_id)
        .ok_or(ServerError::SessionNotFound(session_id))?;

    let mode = ResponseMode::from_voice_flag(request.voice_mode);
    let result = session.ask(&request.message, mode).await?;
    Ok(Json(result))
}

/// Liveness
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
        "voice_enabled": state.voice_enabled(),
    }))
}

/// Readiness: the chat model must answer its availability probe
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let llm_ready = match &state.llm {
        Some(llm) => tokio::time::timeout(READY_PROBE_TIMEOUT, llm.is_available())
            .await
            .unwrap_or(false),
        None => true,
    };

    let status = if llm_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": llm_ready,
            "checks": {
                "llm": if llm_ready { "ok" } else { "unavailable" },
                "speech": if state.voice_enabled() { "ok" } else { "disabled" },
            },
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use realty_agent_agent::{AgentError, Responder};
    use realty_agent_config::Settings;
    use realty_agent_core::Language;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Answers with the last user message; "fail" triggers an upstream error
    struct Mirror;

    #[async_trait]
    impl Responder for Mirror {
        async fn respond(
            &self,
            history: &[ConversationTurn],
            mode: ResponseMode,
        ) -> Result<PipelineResult, AgentError> {
            let last = realty_agent_core::latest_user_message(history)
                .ok_or_else(|| AgentError::Conversation("History has no user message".into()))?;
            if last == "fail" {
                return Err(AgentError::Llm("HTTP 500".into()));
            }
            Ok(PipelineResult {
                text: format!("{} ({} turns, voice={})", last, history.len(), mode.is_voice()),
                image_urls: vec!["http://cdn.example.com/a.jpg".to_string()],
                language: Language::English,
            })
        }

        fn name(&self) -> &str {
            "mirror"
        }
    }

    fn app() -> (AppState, Router) {
        let state = AppState::new(Settings::default(), Arc::new(Mirror));
        (state.clone(), create_router(state))
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_stateless_chat() {
        let (_, router) = app();
        let response = router
            .oneshot(json_request(
                Method::POST,
                "/api/chat",
                serde_json::json!({
                    "history": [
                        {"role": "user", "content": "Show me 3BHK villas in Goa"},
                        {"role": "assistant", "content": "Palm Grove has some."},
                        {"role": "user", "content": "Any with a pool?"}
                    ],
                    "voice_mode": true
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "Any with a pool? (3 turns, voice=true)");
        assert_eq!(body["image_urls"][0], "http://cdn.example.com/a.jpg");
        assert_eq!(body["language"], "en");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let (_, router) = app();
        let response = router
            .oneshot(json_request(
                Method::POST,
                "/api/chat",
                serde_json::json!({"history": [{"role": "user", "content": "fail"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_session_chat_keeps_history() {
        let (state, router) = app();
        let session = state.sessions.create().unwrap();
        let uri = format!("/api/chat/{}", session.id());

        for message in ["Flats in Whitefield?", "What about parking?"] {
            let response = router
                .clone()
                .oneshot(json_request(
                    Method::POST,
                    &uri,
                    serde_json::json!({"message": message}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        // user + assistant per turn
        assert_eq!(session.history().len(), 4);

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sessions/{}", session.id()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["turn_count"], 4);
        assert_eq!(body["history"][3]["content"], "What about parking? (3 turns, voice=false)");
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (state, router) = app();
        let session = state.sessions.create().unwrap();
        let response = router
            .oneshot(json_request(
                Method::POST,
                &format!("/api/chat/{}", session.id()),
                serde_json::json!({"message": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (_, router) = app();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["session_id"].as_str().unwrap().to_string();
        assert_eq!(created["voice_enabled"], false);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_with_origins_builds() {
        let mut settings = Settings::default();
        settings.server.cors_origins = vec!["https://homes.example.com".to_string()];
        let state = AppState::new(settings, Arc::new(Mirror));
        let _ = create_router(state);
    }

    #[tokio::test]
    async fn test_health_and_disabled_metrics() {
        let (_, router) = app();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
