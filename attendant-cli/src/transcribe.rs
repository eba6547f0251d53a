//! Whisper-style HTTP transcription.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use attendant::{AutomationError, Transcriber};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";
const DEFAULT_MODEL: &str = "whisper-1";

fn transcription_err(context: &str, e: impl std::fmt::Display) -> AutomationError {
    AutomationError::Transcription(format!("{context}: {e}"))
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Posts the captured WAV to an OpenAI-compatible transcription endpoint.
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpTranscriber {
    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        info!("transcription endpoint: {endpoint}");
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<String, AutomationError> {
        let audio = tokio::fs::read(path)
            .await
            .map_err(|e| transcription_err("could not read capture", e))?;
        debug!("uploading {} bytes for transcription", audio.len());

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("capture.wav")
            .to_string();
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| transcription_err("could not build upload", e))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transcription_err("request failed", e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transcription_err("could not read response", e))?;
        if !status.is_success() {
            return Err(AutomationError::Transcription(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let decoded = serde_json::from_str::<TranscriptionResponse>(&body)
            .map_err(|e| transcription_err("could not decode response", e))?;
        Ok(decoded.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_text_field() {
        let body = r#"{"text": "  hello from the meeting  "}"#;
        let decoded: TranscriptionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(decoded.text.trim(), "hello from the meeting");
    }

    #[test]
    fn rejects_bodies_without_text() {
        let body = r#"{"error": {"message": "bad audio"}}"#;
        assert!(serde_json::from_str::<TranscriptionResponse>(body).is_err());
    }
}
