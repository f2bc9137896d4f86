use crate::error::PlaybackError;
use crate::synthesis::AudioClip;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// The single audio output channel of a session.
///
/// Playback and capture are mutually exclusive; the orchestrator is the sole
/// arbiter and will never have a `play` outstanding while a capture runs.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait AudioPlayer: Send {
    /// Play a clip to completion. Resolves when the audio has finished
    /// coming out of the speaker, so the caller knows when the candidate has
    /// heard the whole line.
    async fn play(&mut self, clip: AudioClip) -> Result<(), PlaybackError>;

    /// Discard any queued audio immediately.
    async fn stop(&mut self) -> Result<(), PlaybackError>;
}
