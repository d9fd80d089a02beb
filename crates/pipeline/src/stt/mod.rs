//! Speech-to-text providers

mod deepgram;

pub use deepgram::{DeepgramConfig, DeepgramStt};
