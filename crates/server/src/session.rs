//! Session Management
//!
//! In-memory registry of chat sessions keyed by id.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use realty_agent_agent::{ChatSession, Responder};

use crate::metrics::record_active_sessions;
use crate::ServerError;

/// Listing entry for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub idle_secs: u64,
}

impl SessionSummary {
    fn of(session: &ChatSession) -> Self {
        Self {
            session_id: session.id().to_string(),
            turn_count: session.history().len(),
            created_at: session.created_at(),
            idle_secs: session.idle_for().as_secs(),
        }
    }
}

/// Session manager
pub struct SessionManager {
    sessions: DashMap<String, Arc<ChatSession>>,
    responder: Arc<dyn Responder>,
    max_sessions: usize,
    max_history_turns: usize,
}

impl SessionManager {
    pub fn new(responder: Arc<dyn Responder>, max_sessions: usize, max_history_turns: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            responder,
            max_sessions,
            max_history_turns,
        }
    }

    /// Create a new session with a fresh history
    pub fn create(&self) -> Result<Arc<ChatSession>, ServerError> {
        if self.sessions.len() >= self.max_sessions {
            return Err(ServerError::SessionLimit(self.max_sessions));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(ChatSession::new(
            id.clone(),
            self.responder.clone(),
            self.max_history_turns,
        ));
        self.sessions.insert(id.clone(), session.clone());
        record_active_sessions(self.sessions.len());

        tracing::info!(session_id = %id, "Session created");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Returns whether a session was removed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            record_active_sessions(self.sessions.len());
            tracing::info!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Sessions ordered by creation time
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|entry| SessionSummary::of(entry.value()))
            .collect();
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for longer than `timeout`; returns how many went
    pub fn cleanup_idle(&self, timeout: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_for() <= timeout);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            record_active_sessions(self.sessions.len());
            tracing::info!(
                removed,
                remaining = self.sessions.len(),
                "Idle sessions cleaned up"
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use realty_agent_agent::AgentError;
    use realty_agent_core::{ConversationTurn, Language, PipelineResult, ResponseMode};

    struct Canned;

    #[async_trait]
    impl Responder for Canned {
        async fn respond(
            &self,
            _history: &[ConversationTurn],
            _mode: ResponseMode,
        ) -> Result<PipelineResult, AgentError> {
            Ok(PipelineResult {
                text: "ok".to_string(),
                image_urls: Vec::new(),
                language: Language::English,
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn manager(max_sessions: usize) -> SessionManager {
        SessionManager::new(Arc::new(Canned), max_sessions, 40)
    }

    #[test]
    fn test_create_get_remove() {
        let sessions = manager(4);
        let session = sessions.create().unwrap();

        assert!(sessions.get(session.id()).is_some());
        assert_eq!(sessions.count(), 1);
        assert!(sessions.remove(session.id()));
        assert!(!sessions.remove(session.id()));
        assert!(sessions.get(session.id()).is_none());
    }

    #[test]
    fn test_session_limit() {
        let sessions = manager(1);
        sessions.create().unwrap();
        assert!(matches!(sessions.create(), Err(ServerError::SessionLimit(1))));
    }

    #[tokio::test]
    async fn test_list_reports_turns() {
        let sessions = manager(4);
        let session = sessions.create().unwrap();
        session.ask("Any plots near Pune?", ResponseMode::Text).await.unwrap();

        let listed = sessions.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].session_id, session.id());
        assert_eq!(listed[0].turn_count, 2);
    }

    #[test]
    fn test_cleanup_idle() {
        let sessions = manager(4);
        sessions.create().unwrap();

        assert_eq!(sessions.cleanup_idle(Duration::from_secs(3600)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(sessions.cleanup_idle(Duration::ZERO), 1);
        assert_eq!(sessions.count(), 0);
    }
}
