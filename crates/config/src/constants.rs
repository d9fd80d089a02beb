//! Default endpoints, models and tuning values

/// Provider endpoints
pub mod endpoints {
    pub const OPENAI_API: &str = "https://api.openai.com/v1";
    pub const QDRANT: &str = "http://localhost:6334";
    pub const DEEPGRAM_LISTEN: &str = "wss://api.deepgram.com/v1/listen";
    pub const ELEVENLABS_API: &str = "https://api.elevenlabs.io";
}

/// Environment variables consulted for provider credentials
pub mod env_keys {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const DEEPGRAM_API_KEY: &str = "DEEPGRAM_API_KEY";
    pub const ELEVENLABS_API_KEY: &str = "ELEVENLABS_API_KEY";
    pub const QDRANT_API_KEY: &str = "QDRANT_API_KEY";
}

pub mod llm {
    pub const MODEL: &str = "gpt-4.1";
    pub const WARMUP_MODEL: &str = "gpt-4.1-mini";
    pub const TEMPERATURE: f32 = 0.5;
    pub const MAX_TOKENS: u32 = 1024;
    pub const TIMEOUT_SECS: u64 = 60;
}

pub mod rag {
    pub const COLLECTION: &str = "mumbai_projects";
    pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
    pub const VECTOR_DIM: usize = 1536;
    /// Documents retrieved per query
    pub const TOP_K: usize = 15;
}

pub mod speech {
    pub const STT_MODEL: &str = "nova-3-general";
    pub const STT_LANGUAGE: &str = "multi";
    pub const INPUT_SAMPLE_RATE: u32 = 16000;
    pub const TTS_VOICE_ID: &str = "VJzrUxHaC52mTyYHMCnK";
    pub const TTS_MODEL: &str = "eleven_turbo_v2_5";
    pub const TTS_OUTPUT_FORMAT: &str = "pcm_16000";
    pub const TTS_SPEED: f32 = 0.8;
}

pub mod conversation {
    /// Sliding window of turns kept per session
    pub const MAX_HISTORY_TURNS: usize = 40;
    pub const SESSION_TIMEOUT_SECS: u64 = 1800;
}
