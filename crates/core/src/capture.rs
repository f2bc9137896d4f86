use crate::error::CaptureError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Result of probing the runtime for a speech recognition capability.
/// Checked once, when a session starts; an unavailable capability
/// permanently blocks the idle-to-listening transition for that session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

/// A single-shot speech capture device.
///
/// The contract mirrors a push-to-talk recognizer: each capture cycle yields
/// at most one finalized transcript, either because the recognizer endpoints
/// on its own ([`capture`](SpeechCapture::capture) resolves) or because the
/// candidate stops it early ([`finish`](SpeechCapture::finish)).
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechCapture: Send {
    /// Synchronous capability probe, distinct from mid-session errors.
    fn availability(&self) -> Availability;

    /// Begin capturing and resolve with the finalized transcript once the
    /// recognizer decides the candidate is done speaking.
    async fn capture(&mut self) -> Result<String, CaptureError>;

    /// Finalize the current capture early, returning whatever was heard so
    /// far. May be empty if the candidate never spoke.
    async fn finish(&mut self) -> Result<String, CaptureError>;

    /// Abandon the current capture and discard any buffered audio.
    fn cancel(&mut self);
}
