//! Audio frame types and utilities

use serde::{Deserialize, Serialize};

/// Audio encoding formats carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// 16-bit signed PCM (little-endian)
    #[default]
    Pcm16,
    /// MPEG layer 3, opaque bytes
    Mp3,
}

impl AudioEncoding {
    /// Parse a provider output format such as `pcm_16000` or `mp3_44100_128`.
    ///
    /// Returns the encoding and the sample rate encoded in the name.
    pub fn from_output_format(format: &str) -> Option<(Self, u32)> {
        let mut parts = format.split('_');
        let encoding = match parts.next()? {
            "pcm" => Self::Pcm16,
            "mp3" => Self::Mp3,
            _ => return None,
        };
        let sample_rate = parts.next()?.parse().ok()?;
        Some((encoding, sample_rate))
    }
}

/// A chunk of audio travelling in or out of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u16,
    /// Monotonic sequence number within one stream
    pub sequence: u64,
}

impl AudioFrame {
    /// Mono 16-bit PCM frame
    pub fn pcm16(data: Vec<u8>, sample_rate: u32) -> Self {
        Self {
            data,
            encoding: AudioEncoding::Pcm16,
            sample_rate,
            channels: 1,
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
