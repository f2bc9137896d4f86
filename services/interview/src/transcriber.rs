use async_trait::async_trait;
use greenroom_core::error::CaptureError;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Turns a finished WAV recording into text. Separated from the microphone
/// plumbing so the endpointing logic can be tested without a network.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Transcribe: Send + Sync {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, CaptureError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// [`Transcribe`] backed by the OpenAI transcription endpoint.
pub struct WhisperTranscriber {
    client: Client,
    api_key: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Transcribe for WhisperTranscriber {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, CaptureError> {
        let file = Part::bytes(wav)
            .file_name("capture.wav")
            .mime_str("audio/wav")
            .map_err(|e| CaptureError::Recognition(e.to_string()))?;
        // Single-shot recognition, fixed English locale.
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", "en");

        let resp = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaptureError::Recognition(e.to_string()))?
            .error_for_status()
            .map_err(|e| CaptureError::Recognition(e.to_string()))?
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| CaptureError::Recognition(e.to_string()))?;

        Ok(resp.text)
    }
}
