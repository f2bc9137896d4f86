//! Application configuration.
//!
//! Settings come from environment variables (a local `.env` file is honored
//! for development) and are validated into a single struct passed through
//! the application.

use std::env;
use tracing::Level;

// --- Audio constants ---

/// The size of each audio chunk taken from the microphone input stream.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// The size of each audio chunk for the audio output stream.
pub const OUTPUT_CHUNK_SIZE: usize = 1024;
/// How much synthesized audio the output ring buffer can hold, in
/// milliseconds of playback.
pub const OUTPUT_LATENCY_MS: usize = 1000;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub chat_model: String,
    pub speech_model: String,
    pub speech_voice: String,
    pub transcribe_model: String,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `OPENAI_API_KEY`: Secret key for the OpenAI API. Required.
    // *   `CHAT_MODEL`: (Optional) Model behind the interviewer and the feedback report. Defaults to "gpt-4o".
    // *   `SPEECH_MODEL`: (Optional) Text-to-speech model. Defaults to "tts-1".
    // *   `SPEECH_VOICE`: (Optional) Text-to-speech voice. Defaults to "alloy".
    // *   `TRANSCRIBE_MODEL`: (Optional) Transcription model. Defaults to "whisper-1".
    // *   `RUST_LOG`: (Optional) Logging level, defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Ignored when no .env file is present.
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let chat_model = env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let speech_model = env::var("SPEECH_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        let speech_voice = env::var("SPEECH_VOICE").unwrap_or_else(|_| "alloy".to_string());
        let transcribe_model =
            env::var("TRANSCRIBE_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            openai_api_key,
            chat_model,
            speech_model,
            speech_voice,
            transcribe_model,
            log_level,
        })
    }
}
