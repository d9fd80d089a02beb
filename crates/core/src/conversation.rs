//! Conversation turns and the per-session history store

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// Speaker tag used when history is rendered into a prompt
    pub fn speaker(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// The most recent user utterance in a history, if any
pub fn latest_user_message(turns: &[ConversationTurn]) -> Option<&str> {
    turns
        .iter()
        .rev()
        .find(|t| t.role == TurnRole::User)
        .map(|t| t.content.as_str())
}

/// Append-only turn store shared by everything acting on one session.
///
/// All mutation goes through one lock, so concurrent utterances append in a
/// well-defined order and every snapshot is internally consistent. A
/// non-zero `max_turns` keeps a sliding window of the newest turns.
#[derive(Debug)]
pub struct ConversationHistory {
    turns: Mutex<VecDeque<ConversationTurn>>,
    max_turns: usize,
}

impl ConversationHistory {
    /// Unbounded history
    pub fn new() -> Self {
        Self::with_max_turns(0)
    }

    /// History keeping at most `max_turns` turns (0 = unbounded)
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            max_turns,
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Append a turn and return a snapshot that includes it
    pub fn append(&self, turn: ConversationTurn) -> Vec<ConversationTurn> {
        let mut turns = self.turns.lock();
        turns.push_back(turn);
        if self.max_turns > 0 {
            while turns.len() > self.max_turns {
                turns.pop_front();
            }
        }
        turns.iter().cloned().collect()
    }

    pub fn push_user(&self, content: impl Into<String>) -> Vec<ConversationTurn> {
        self.append(ConversationTurn::user(content))
    }

    pub fn push_assistant(&self, content: impl Into<String>) -> Vec<ConversationTurn> {
        self.append(ConversationTurn::assistant(content))
    }

    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.lock().is_empty()
    }

    pub fn clear(&self) {
        self.turns.lock().clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}
