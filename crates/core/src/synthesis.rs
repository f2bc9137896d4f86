use crate::error::SynthesisError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// A playable chunk of mono PCM16 audio produced by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub pcm: Vec<i16>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, pcm: Vec<i16>) -> Self {
        Self { sample_rate, pcm }
    }

    /// Playback length of the clip.
    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.pcm.len() as f64 / self.sample_rate as f64)
    }
}

/// Turns interviewer text into playable audio. Implementations must report
/// every failure as a [`SynthesisError`] rather than panicking; the
/// orchestrator treats a failed synthesis as a cue to continue text-only.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError>;
}
