//! Speech-to-text engines

use async_trait::async_trait;
use reqwest::multipart;
use scriptorium_common::config::TranscriptionConfig;
use scriptorium_common::errors::{AppError, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TranscriptionError;

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe an audio file; `file_name` carries the container format
    async fn transcribe(&self, audio_data: &[u8], file_name: &str) -> std::result::Result<String, TranscriptionError>;

    fn name(&self) -> &str;
}

/// MIME type for an audio file name
pub fn audio_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// OpenAI-compatible `/audio/transcriptions` client
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: String, config: &TranscriptionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    async fn transcribe(&self, audio_data: &[u8], file_name: &str) -> std::result::Result<String, TranscriptionError> {
        if audio_data.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let url = format!("{}/audio/transcriptions", self.base_url);

        let file_part = multipart::Part::bytes(audio_data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(audio_mime(file_name))
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file_part);

        tracing::debug!(model = %self.model, size = audio_data.len(), "Sending audio to Whisper API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("body: {}", e)))?;

        tracing::info!(chars = transcript.len(), "Whisper transcription completed");

        Ok(transcript.trim().to_string())
    }

    fn name(&self) -> &str {
        "openai-whisper"
    }
}

/// Offline engine: answers with a fixed transcript, or always fails
pub struct MockTranscriptionEngine {
    transcript: Option<String>,
    fail: bool,
}

impl MockTranscriptionEngine {
    /// Answer every request with `transcript`
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: Some(transcript.into()),
            fail: false,
        }
    }

    /// Describe the received audio instead of a fixed transcript
    pub fn echo() -> Self {
        Self { transcript: None, fail: false }
    }

    pub fn failing() -> Self {
        Self { transcript: None, fail: true }
    }
}

#[async_trait]
impl TranscriptionEngine for MockTranscriptionEngine {
    async fn transcribe(&self, audio_data: &[u8], file_name: &str) -> std::result::Result<String, TranscriptionError> {
        if self.fail {
            return Err(TranscriptionError::ApiRequestFailed("mock engine failure".to_string()));
        }
        if audio_data.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }
        Ok(self
            .transcript
            .clone()
            .unwrap_or_else(|| format!("Transcribed {} bytes from {}", audio_data.len(), file_name)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Create a transcription engine based on configuration.
///
/// The OpenAI provider falls back to `OPENAI_API_KEY` when no key is configured.
pub fn create_engine(config: &TranscriptionConfig) -> Result<Arc<dyn TranscriptionEngine>> {
    match config.provider.as_str() {
        "openai" => {
            let key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.is_empty())
                .ok_or_else(|| AppError::Configuration {
                    message: "OpenAI API key required for the transcription provider".to_string(),
                })?;
            Ok(Arc::new(OpenAiWhisperEngine::new(key, config)?))
        }
        "mock" => Ok(Arc::new(MockTranscriptionEngine::echo())),
        other => {
            tracing::warn!(provider = other, "Unknown transcription provider, using mock");
            Ok(Arc::new(MockTranscriptionEngine::echo()))
        }
    }
}
