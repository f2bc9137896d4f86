//! Failure taxonomy for the conversation core.
//!
//! Each adapter boundary gets its own error enum so the orchestrator can
//! route every failure to an explicit target state: capture and dialogue
//! failures send the session back to idle for a retry, synthesis and
//! playback failures degrade the session to text-only.

use thiserror::Error;

/// A mid-session speech recognition failure. Capability absence is not an
/// error; it is reported synchronously by
/// [`crate::capture::SpeechCapture::availability`].
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("speech recognition failed: {0}")]
    Recognition(String),
    #[error("audio input stream closed")]
    InputClosed,
}

/// A dialogue engine failure. Distinguishable from a successful turn so the
/// orchestrator never has to guess; it also never invents an interviewer
/// line of its own on any of these.
#[derive(Debug, Clone, Error)]
pub enum DialogueError {
    #[error("dialogue engine timed out")]
    Timeout,
    #[error("dialogue engine transport failure: {0}")]
    Transport(String),
    #[error("dialogue engine returned no choices")]
    Empty,
    #[error("dialogue engine returned malformed output: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error("speech synthesis timed out")]
    Timeout,
    #[error("speech synthesis transport failure: {0}")]
    Transport(String),
    #[error("speech synthesis produced no audio")]
    NoAudio,
}

#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("audio playback failed: {0}")]
    Failed(String),
}
