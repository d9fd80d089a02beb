//! Prompt composition
//!
//! Builds the single instruction block sent as the final user message of a
//! turn: concierge persona and rules, the conversation so far, retrieved
//! project context, image candidates, reply language and output contract.

use realty_agent_core::{ConversationTurn, Language, ResponseMode, TurnRole};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for Message {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.into(),
            content: turn.content.clone(),
        }
    }
}

const DEFAULT_PERSONA: &str = "You are a refined real-estate concierge for premium residential \
projects. Speak with warmth and quiet confidence, the way a trusted advisor speaks to a \
discerning home buyer.";

const RULES: &str = "\
Guidelines:
- Start with an overview of the locality. Recommend specific projects only when they match the \
user's stated requirements, budget and lifestyle, and do not pitch projects at every turn.
- Use investment and desirability figures such as price appreciation, rental yield or \
investment-grade scores only when the user explicitly asks about investment potential, returns or \
long-term value. Explain what they mean in plain words instead of listing every number.
- Otherwise focus on lifestyle, design, location and the user's stated preferences.
- Assess the previous conversation to tailor the answer to what the user has already said.
- Do not repeat points you have already made earlier in the conversation.
- Mention only projects, prices and facts present in the project information below. Never invent \
project names or details.
- Do not use the # character or quote characters in the answer text.
- Use as few words as the question allows.
- Do not recommend projects that are outside the budget the user has mentioned.";

const HINGLISH_RULE: &str = "The reply language is Hindi, so answer the way people speak in \
everyday conversation, naturally mixing Hindi and English (Hinglish).";

const VOICE_DIRECTIVE: &str = "You are speaking aloud to a person in a voice conversation. Use a \
natural spoken tone. Expand numbers and abbreviations into words. Keep the reply to about 40 \
words and end with a follow-up question.";

const OUTPUT_CONTRACT: &str = "\
Respond with exactly one JSON object and nothing else, in this format:
{\"answer\": \"<your reply>\", \"image_urls\": [\"<image url>\"]}
Put in image_urls only URLs listed under Project image candidates that belong to the projects \
you mention. Use an empty list when none apply.";

/// Everything one prompt is built from
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    /// Newline-joined document contents (or its placeholder)
    pub context: &'a str,
    /// The latest user utterance
    pub query: &'a str,
    /// Full history, including the latest user turn
    pub history: &'a [ConversationTurn],
    pub language: Language,
    /// Newline-joined `- label: url` lines (or its placeholder)
    pub images: &'a str,
    pub mode: ResponseMode,
}

/// Builds the instruction block for one turn
#[derive(Debug, Clone)]
pub struct PromptComposer {
    persona: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the opening persona paragraph
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Render history as `User: ...` / `Assistant: ...` lines, oldest first
    pub fn format_history(history: &[ConversationTurn]) -> String {
        history
            .iter()
            .map(|turn| format!("{}: {}", turn.role.speaker(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Voice-mode directive, empty for text replies
    pub fn voice_directive(mode: ResponseMode) -> &'static str {
        match mode {
            ResponseMode::Voice => VOICE_DIRECTIVE,
            ResponseMode::Text => "",
        }
    }

    pub fn compose(&self, inputs: &PromptInputs<'_>) -> String {
        let mut prompt = String::with_capacity(
            2048 + inputs.context.len() + inputs.images.len() + inputs.query.len(),
        );

        prompt.push_str(&self.persona);
        prompt.push_str("\n\n");
        prompt.push_str(RULES);
        prompt.push_str("\n\n");

        prompt.push_str(&format!(
            "Always reply in the detected language: {} ({}).\n",
            inputs.language.name(),
            inputs.language.code()
        ));
        if inputs.language.prefers_code_mixing() {
            prompt.push_str(HINGLISH_RULE);
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "\nPrevious conversation:\n{}\n",
            Self::format_history(inputs.history)
        ));
        prompt.push_str(&format!("\nCurrent user message:\n{}\n", inputs.query));
        prompt.push_str(&format!("\nProject information:\n{}\n", inputs.context));
        prompt.push_str(&format!("\nProject image candidates:\n{}\n", inputs.images));
        prompt.push_str(&format!("\n{OUTPUT_CONTRACT}\n"));

        let directive = Self::voice_directive(inputs.mode);
        if !directive.is_empty() {
            prompt.push_str(&format!("\n{directive}\n"));
        }

        prompt.push_str("\nYour response:");
        prompt
    }
}
