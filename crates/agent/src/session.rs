//! Chat sessions
//!
//! A session owns one conversation history and answers messages against it
//! through a shared `Responder`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use realty_agent_core::{ConversationHistory, ConversationTurn, PipelineResult, ResponseMode};

use crate::traits::Responder;
use crate::AgentError;

/// One conversation
pub struct ChatSession {
    id: String,
    history: Arc<ConversationHistory>,
    responder: Arc<dyn Responder>,
    created_at: DateTime<Utc>,
    last_activity: Mutex<Instant>,
}

impl ChatSession {
    /// New session keeping at most `max_turns` turns (0 = unbounded)
    pub fn new(id: impl Into<String>, responder: Arc<dyn Responder>, max_turns: usize) -> Self {
        Self {
            id: id.into(),
            history: Arc::new(ConversationHistory::with_max_turns(max_turns)),
            responder,
            created_at: Utc::now(),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &Arc<ConversationHistory> {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append `message` as a user turn, answer it, and append the answer.
    ///
    /// The user turn stays in the history even when the responder fails.
    pub async fn ask(
        &self,
        message: &str,
        mode: ResponseMode,
    ) -> Result<PipelineResult, AgentError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AgentError::Conversation("Empty message".to_string()));
        }
        self.touch();

        let snapshot = self.history.append(ConversationTurn::user(message));
        let result = self.responder.respond(&snapshot, mode).await?;
        self.history.push_assistant(result.text.clone());
        self.touch();

        tracing::debug!(
            session_id = %self.id,
            turns = self.history.len(),
            "Turn completed"
        );
        Ok(result)
    }

    pub fn reset(&self) {
        self.history.clear();
        self.touch();
    }

    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }
}
