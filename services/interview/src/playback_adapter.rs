use async_trait::async_trait;
use greenroom_core::error::PlaybackError;
use greenroom_core::playback::AudioPlayer;
use greenroom_core::synthesis::AudioClip;
use greenroom_native_utils::audio;
use ringbuf::HeapProd;
use ringbuf::traits::{Observer, Producer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const RESAMPLER_CHUNK: usize = 1024;
const PUSH_BACKOFF: Duration = Duration::from_millis(5);
const DRAIN_POLL: Duration = Duration::from_millis(20);
/// Slack for the device to play out its final hardware buffer.
const DEVICE_TAIL: Duration = Duration::from_millis(60);

/// [`AudioPlayer`] over the machine's line-out.
///
/// The cpal output callback in `main` owns the consumer half of the ring
/// buffer; this adapter resamples a clip to the device rate, pushes it into
/// the producer half, and resolves once the buffer has drained. The shared
/// purge flag tells the callback to discard everything queued.
pub struct LineOutPlayer {
    producer: HeapProd<f32>,
    output_sample_rate: u32,
    purge: Arc<AtomicBool>,
}

impl LineOutPlayer {
    pub fn new(producer: HeapProd<f32>, output_sample_rate: u32, purge: Arc<AtomicBool>) -> Self {
        Self {
            producer,
            output_sample_rate,
            purge,
        }
    }
}

#[async_trait]
impl AudioPlayer for LineOutPlayer {
    async fn play(&mut self, clip: AudioClip) -> Result<(), PlaybackError> {
        let samples = audio::convert_i16_to_f32(&clip.pcm);
        let samples = if clip.sample_rate == self.output_sample_rate {
            samples
        } else {
            let mut resampler = audio::create_resampler(
                clip.sample_rate as f64,
                self.output_sample_rate as f64,
                RESAMPLER_CHUNK,
            )
            .map_err(|e| PlaybackError::Failed(e.to_string()))?;
            audio::resample_all(&mut resampler, &samples)
                .map_err(|e| PlaybackError::Failed(e.to_string()))?
        };

        // A new clip supersedes any earlier stop request.
        self.purge.store(false, Ordering::Release);

        for sample in samples {
            let mut pending = sample;
            loop {
                if self.purge.load(Ordering::Acquire) {
                    return Ok(());
                }
                match self.producer.try_push(pending) {
                    Ok(()) => break,
                    Err(rejected) => {
                        pending = rejected;
                        tokio::time::sleep(PUSH_BACKOFF).await;
                    }
                }
            }
        }

        // Resolve only once the candidate has heard the whole line.
        while self.producer.occupied_len() > 0 {
            if self.purge.load(Ordering::Acquire) {
                return Ok(());
            }
            tokio::time::sleep(DRAIN_POLL).await;
        }
        tokio::time::sleep(DEVICE_TAIL).await;

        Ok(())
    }

    async fn stop(&mut self) -> Result<(), PlaybackError> {
        self.purge.store(true, Ordering::Release);
        Ok(())
    }
}

/// Stands in when no output device could be opened. Every play attempt
/// fails, which the session reports once per line and then carries on
/// text-only.
pub struct MutePlayer;

#[async_trait]
impl AudioPlayer for MutePlayer {
    async fn play(&mut self, _clip: AudioClip) -> Result<(), PlaybackError> {
        Err(PlaybackError::Failed("no output device".to_string()))
    }

    async fn stop(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }
}
