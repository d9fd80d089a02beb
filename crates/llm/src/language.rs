//! Reply-language detection

use std::sync::Arc;

use realty_agent_core::Language;

use crate::backend::LlmBackend;
use crate::prompt::Message;
use crate::LlmError;

const DETECTION_INSTRUCTION: &str = "Detect the language the user is speaking in and reply with \
the language name only. If the message mixes Hindi and English, reply with the more native \
language, Hindi.";

/// Classifies an utterance as English, Hindi or Tamil with one model call
#[derive(Clone)]
pub struct LanguageDetector {
    backend: Arc<dyn LlmBackend>,
}

impl LanguageDetector {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Classification prompt for `utterance`
    pub fn detection_prompt(utterance: &str) -> String {
        format!("{DETECTION_INSTRUCTION}\nUser: {utterance}")
    }

    /// Detect the reply language. Unrecognized labels map to Hindi; model
    /// failures propagate.
    pub async fn detect(&self, utterance: &str) -> Result<Language, LlmError> {
        let result = self
            .backend
            .generate(&[Message::user(Self::detection_prompt(utterance))])
            .await?;

        let label = result.text.trim();
        let language = Language::from_label(label);
        tracing::debug!(label, language = %language, "Detected reply language");
        Ok(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FinishReason, GenerationResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FixedBackend {
        reply: Result<String, ()>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl FixedBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for FixedBackend {
        async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
            self.seen.lock().push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    tokens: 1,
                    total_time_ms: 1,
                    finish_reason: FinishReason::Stop,
                }),
                Err(()) => Err(LlmError::Api("HTTP 429: quota".to_string())),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_detects_known_labels() {
        for (label, expected) in [
            ("English", Language::English),
            (" hindi \n", Language::Hindi),
            ("Tamil", Language::Tamil),
        ] {
            let detector = LanguageDetector::new(Arc::new(FixedBackend::replying(label)));
            assert_eq!(detector.detect("anything").await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_label_defaults_to_hindi() {
        let detector = LanguageDetector::new(Arc::new(FixedBackend::replying("Marathi")));
        assert_eq!(detector.detect("Mala ghar pahije").await.unwrap(), Language::Hindi);
    }

    #[tokio::test]
    async fn test_sends_single_classification_message() {
        let backend = Arc::new(FixedBackend::replying("Hindi"));
        let detector = LanguageDetector::new(backend.clone());
        detector.detect("Yeh property kaisi hai?").await.unwrap();

        let seen = backend.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 1);
        assert!(seen[0][0].content.ends_with("User: Yeh property kaisi hai?"));
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let detector = LanguageDetector::new(Arc::new(FixedBackend::failing()));
        assert!(matches!(detector.detect("hello").await, Err(LlmError::Api(_))));
    }
}
