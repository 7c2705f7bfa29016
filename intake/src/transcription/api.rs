use std::time::Duration;

use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::TranscriptionConfig,
    error::{IntakeError, Result},
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    segments: Vec<TranscriptionSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TranscriptionSegment {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone)]
pub struct TranscriptionApiClient {
    client: Client,
    config: TranscriptionConfig,
}

impl TranscriptionApiClient {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        // Validate config
        if config.api_key.is_none() {
            return Err(IntakeError::Transcription(
                "API key required for transcription API".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IntakeError::Transcription(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub async fn transcribe(
        &self,
        audio_bytes: &[u8],
        file_extension: Option<&str>,
    ) -> Result<String> {
        let mut last_error: Option<IntakeError> = None;
        let max_retries = 3; // Default max retries

        for attempt in 0..=max_retries {
            if attempt > 0 {
                // Exponential backoff: 100ms, 200ms, 400ms
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms", attempt, delay_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.transcribe_internal(audio_bytes, file_extension).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    // Check if error is retryable
                    let retryable = matches!(
                        &e,
                        IntakeError::Transcription(msg) if msg.contains("500") || msg.contains("timeout")
                    );

                    if !retryable {
                        // Non-retryable error (401, 429, etc.) - return immediately
                        return Err(e);
                    }

                    if attempt < max_retries {
                        warn!(
                            "Transcription attempt {} failed (retryable): {}",
                            attempt + 1,
                            e
                        );
                        last_error = Some(e);
                        continue;
                    }

                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            IntakeError::Transcription("Transcription failed after retries".to_string())
        }))
    }

    async fn transcribe_internal(
        &self,
        audio_bytes: &[u8],
        file_extension: Option<&str>,
    ) -> Result<String> {
        // Build multipart form
        let file_name = format!("audio.{}", file_extension.unwrap_or("mp3"));
        let mime_type = self.infer_mime_type(file_extension);

        let file_part = multipart::Part::bytes(audio_bytes.to_vec())
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|e| IntakeError::Transcription(format!("Invalid MIME type: {e}")))?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("response_format", "json");

        // Build request
        let base_url = self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
        let url = format!("{base_url}/audio/transcriptions");

        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| IntakeError::Transcription("API key not configured".to_string()))?;

        debug!("Sending transcription request to {}", url);

        // Send request
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntakeError::Transcription("Request timeout".to_string())
                } else {
                    IntakeError::Transcription(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        debug!("Transcription response status: {}", status);

        // Handle HTTP errors
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            return Err(self.map_http_error(status, &error_body));
        }

        // Parse response
        let transcription_response: TranscriptionResponse = response.json().await.map_err(|e| {
            IntakeError::Transcription(format!("Failed to parse transcription response: {e}"))
        })?;

        if transcription_response.text.trim().is_empty() {
            return Err(IntakeError::Transcription(
                "Transcription response contained empty text".to_string(),
            ));
        }

        Ok(transcription_response.text)
    }

    fn infer_mime_type(&self, file_extension: Option<&str>) -> String {
        match file_extension {
            Some("mp3") => "audio/mpeg",
            Some("wav") => "audio/wav",
            Some("m4a") => "audio/mp4",
            Some("ogg") => "audio/ogg",
            Some("webm") => "audio/webm",
            Some("flac") => "audio/flac",
            _ => "audio/mpeg", // Default to MP3
        }
        .to_string()
    }

    fn map_http_error(&self, status: StatusCode, error_body: &str) -> IntakeError {
        match status {
            StatusCode::UNAUTHORIZED => IntakeError::Transcription(format!(
                "Authentication failed (401): Invalid API key. Error: {error_body}"
            )),
            StatusCode::TOO_MANY_REQUESTS => IntakeError::Transcription(format!(
                "Rate limit exceeded (429): Too many requests. Error: {error_body}"
            )),
            StatusCode::INTERNAL_SERVER_ERROR => IntakeError::Transcription(format!(
                "Server error (500): The transcription service encountered an error. Error: {error_body}"
            )),
            _ => IntakeError::Transcription(format!(
                "Transcription API error ({status}): {error_body}"
            )),
        }
    }
}
