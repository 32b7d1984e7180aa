//! OpenAI speech API provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{request_error, retry_after};
use crate::config::ProviderConfig;
use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MODEL: &str = "tts-1";
const VOICE: &str = "alloy";

/// Provider for the OpenAI `/audio/speech` endpoint
pub struct OpenAiSpeechProvider {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    client: Client,
}

impl OpenAiSpeechProvider {
    /// Create a new OpenAI speech provider
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TtsError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            base_url,
            api_key,
            timeout_secs: config.timeout_secs,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl SpeechProvider for OpenAiSpeechProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        if request.text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        // The model detects the language from the input text.
        let body = SpeechBody {
            model: MODEL,
            input: &request.text,
            voice: VOICE,
            response_format: self.audio_extension(),
        };

        let url = format!("{}/audio/speech", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout_secs))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TtsError::RateLimited {
                retry_after: retry_after(&response),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(error_response) => error_response.error.message,
                Err(_) => error_text,
            };
            return Err(TtsError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| request_error(e, self.timeout_secs))?;

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio(self.name().to_string()));
        }
        Ok(audio.to_vec())
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn audio_extension(&self) -> &'static str {
        "mp3"
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}
