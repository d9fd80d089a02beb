//! Core traits for the agent
//!
//! External services sit behind these traits so the pipeline and the voice
//! session can be driven by mocks in tests:
//!
//! ```text
//! Retrieval:
//!   - Retriever: similarity search over indexed documents
//!
//! Speech:
//!   - SpeechToText: streaming audio -> transcript events
//!   - TextToSpeech: text -> streamed audio chunks
//! ```

mod retriever;
mod speech;

pub use retriever::{RetrieveOptions, Retriever};
pub use speech::{AudioStream, SpeechToText, TextToSpeech, TranscriptStream};
