use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

const SPEECH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech service answered {0}")]
    Status(reqwest::StatusCode),
    #[error("speech service returned no audio")]
    Empty,
    #[error("could not write speech file: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Renders `text` to an audio file and returns its path once fully written.
    async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError>;
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// OpenAI-style `/v1/audio/speech` endpoint (e.g. an edge-tts bridge).
pub struct HttpSpeech {
    http: reqwest::Client,
    url: String,
    voice: String,
    api_key: Option<String>,
    output: PathBuf,
}

impl HttpSpeech {
    pub fn new(
        http: reqwest::Client,
        url: String,
        voice: String,
        api_key: Option<String>,
        output: PathBuf,
    ) -> Self {
        Self {
            http,
            url,
            voice,
            api_key,
            output,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeech {
    async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError> {
        let mut req = self
            .http
            .post(&self.url)
            .json(&SpeechRequest {
                model: "tts-1",
                input: text,
                voice: &self.voice,
                response_format: "mp3",
            })
            .timeout(SPEECH_TIMEOUT);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(SpeechError::Status(resp.status()));
        }

        let audio = resp.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::Empty);
        }
        tokio::fs::write(&self.output, &audio).await?;
        Ok(self.output.clone())
    }
}
