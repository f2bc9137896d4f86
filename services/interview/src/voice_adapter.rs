use async_trait::async_trait;
use greenroom_core::error::SynthesisError;
use greenroom_core::synthesis::{AudioClip, SpeechSynthesizer};
use greenroom_native_utils::audio::{SPEECH_API_SAMPLE_RATE, pcm16_bytes_to_i16};
use reqwest::Client;
use serde_json::json;

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// [`SpeechSynthesizer`] backed by the OpenAI speech endpoint. Asking for
/// raw PCM keeps the playback path a plain resample-and-push, no decoder.
pub struct OpenAiVoice {
    client: Client,
    api_key: String,
    model: String,
    voice: String,
}

impl OpenAiVoice {
    pub fn new(api_key: String, model: String, voice: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            voice,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiVoice {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        let body = json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "pcm",
        });

        let resp = self
            .client
            .post(SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SynthesisError::NoAudio);
        }

        // The endpoint returns 24 kHz mono PCM16.
        Ok(AudioClip::new(
            SPEECH_API_SAMPLE_RATE,
            pcm16_bytes_to_i16(&bytes),
        ))
    }
}
