//! Text-to-speech providers

mod elevenlabs;

pub use elevenlabs::{ElevenLabsConfig, ElevenLabsTts};
