use crate::transcriber::Transcribe;
use async_trait::async_trait;
use greenroom_core::capture::{Availability, SpeechCapture};
use greenroom_core::error::CaptureError;
use greenroom_native_utils::audio::{self, SPEECH_API_SAMPLE_RATE};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const RESAMPLER_CHUNK: usize = 1024;

/// Silence-endpointing policy. Thresholds are converted to sample counts
/// against the device rate, so the decision depends only on the audio fed
/// in, not on wall-clock time.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// RMS level a chunk must reach to count as speech.
    pub voice_threshold: f32,
    /// Trailing silence after speech that finalizes the capture.
    pub trailing_silence: Duration,
    /// Hard cap on the length of a single utterance.
    pub max_utterance: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            voice_threshold: 0.015,
            trailing_silence: Duration::from_millis(1200),
            max_utterance: Duration::from_secs(60),
        }
    }
}

/// [`SpeechCapture`] over the machine's microphone.
///
/// The cpal input callback lives in `main` and pushes mono f32 chunks into
/// the channel whenever the gate flag is raised; this adapter raises the
/// gate for the duration of one capture, endpoints on trailing silence, and
/// hands the finished recording to the transcriber.
pub struct MicCapture<T> {
    transcriber: T,
    gate: Arc<AtomicBool>,
    chunks: mpsc::Receiver<Vec<f32>>,
    sample_rate: u32,
    endpoint: EndpointConfig,
    availability: Availability,
    buffer: Vec<f32>,
    heard_voice: bool,
    trailing_silence_samples: usize,
}

impl<T> MicCapture<T> {
    pub fn new(
        transcriber: T,
        gate: Arc<AtomicBool>,
        chunks: mpsc::Receiver<Vec<f32>>,
        sample_rate: u32,
        endpoint: EndpointConfig,
    ) -> Self {
        Self {
            transcriber,
            gate,
            chunks,
            sample_rate,
            endpoint,
            availability: Availability::Available,
            buffer: Vec::new(),
            heard_voice: false,
            trailing_silence_samples: 0,
        }
    }

    /// Built when no input device could be opened. The probe result blocks
    /// the session from ever starting a capture, so the other fields are
    /// never exercised.
    pub fn unavailable(
        transcriber: T,
        chunks: mpsc::Receiver<Vec<f32>>,
        reason: String,
    ) -> Self {
        Self {
            transcriber,
            gate: Arc::new(AtomicBool::new(false)),
            chunks,
            sample_rate: SPEECH_API_SAMPLE_RATE,
            endpoint: EndpointConfig::default(),
            availability: Availability::Unavailable(reason),
            buffer: Vec::new(),
            heard_voice: false,
            trailing_silence_samples: 0,
        }
    }

    fn begin(&mut self) {
        self.buffer.clear();
        self.heard_voice = false;
        self.trailing_silence_samples = 0;
        // Drop any audio that leaked in since the last capture.
        while self.chunks.try_recv().is_ok() {}
        self.gate.store(true, Ordering::Release);
    }

    /// Buffers one chunk; true once the capture should be finalized.
    fn absorb(&mut self, chunk: &[f32]) -> bool {
        if rms(chunk) >= self.endpoint.voice_threshold {
            self.heard_voice = true;
            self.trailing_silence_samples = 0;
        } else if self.heard_voice {
            self.trailing_silence_samples += chunk.len();
        }
        self.buffer.extend_from_slice(chunk);

        let hang = samples_for(self.endpoint.trailing_silence, self.sample_rate);
        let cap = samples_for(self.endpoint.max_utterance, self.sample_rate);
        (self.heard_voice && self.trailing_silence_samples >= hang) || self.buffer.len() >= cap
    }
}

impl<T: Transcribe> MicCapture<T> {
    async fn finalize(&mut self) -> Result<String, CaptureError> {
        self.gate.store(false, Ordering::Release);
        while let Ok(chunk) = self.chunks.try_recv() {
            self.buffer.extend_from_slice(&chunk);
        }

        if !self.heard_voice {
            tracing::debug!("capture finalized without hearing speech");
            self.buffer.clear();
            return Ok(String::new());
        }

        let samples = std::mem::take(&mut self.buffer);
        let samples = if self.sample_rate == SPEECH_API_SAMPLE_RATE {
            samples
        } else {
            let mut resampler = audio::create_resampler(
                self.sample_rate as f64,
                SPEECH_API_SAMPLE_RATE as f64,
                RESAMPLER_CHUNK,
            )
            .map_err(|e| CaptureError::Recognition(e.to_string()))?;
            audio::resample_all(&mut resampler, &samples)
                .map_err(|e| CaptureError::Recognition(e.to_string()))?
        };

        let wav = audio::wav_from_f32(&samples, SPEECH_API_SAMPLE_RATE)
            .map_err(|e| CaptureError::Recognition(e.to_string()))?;
        self.transcriber.transcribe(wav).await
    }
}

#[async_trait]
impl<T: Transcribe> SpeechCapture for MicCapture<T> {
    fn availability(&self) -> Availability {
        self.availability.clone()
    }

    async fn capture(&mut self) -> Result<String, CaptureError> {
        self.begin();
        loop {
            match self.chunks.recv().await {
                None => {
                    self.gate.store(false, Ordering::Release);
                    return Err(CaptureError::InputClosed);
                }
                Some(chunk) => {
                    if self.absorb(&chunk) {
                        return self.finalize().await;
                    }
                }
            }
        }
    }

    async fn finish(&mut self) -> Result<String, CaptureError> {
        self.finalize().await
    }

    fn cancel(&mut self) {
        self.gate.store(false, Ordering::Release);
        self.buffer.clear();
        self.heard_voice = false;
        self.trailing_silence_samples = 0;
        while self.chunks.try_recv().is_ok() {}
    }
}

fn rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    (chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32).sqrt()
}

fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64) as usize
}
