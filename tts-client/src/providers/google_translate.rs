//! Google Translate speech provider
//!
//! Uses the same `batchexecute` RPC the Translate web UI calls for its
//! "listen" button. No API key is needed, but the endpoint only accepts
//! short inputs, so each request text is sent in pieces of at most
//! [`MAX_REQUEST_CHARS`] characters and the returned MP3 streams are
//! concatenated.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;
use reqwest::Client;
use serde_json::{Value, json};

use super::{request_error, retry_after};
use crate::config::ProviderConfig;
use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, SpeechRequest};

const RPC_ID: &str = "jQ1olc";
const MAX_REQUEST_CHARS: usize = 100;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/47.0.2526.106 Safari/537.36";

/// Provider for the Google Translate speech endpoint
pub struct GoogleTranslateProvider {
    tld: String,
    slow: bool,
    timeout_secs: u64,
    audio_pattern: Regex,
    client: Client,
}

impl GoogleTranslateProvider {
    /// Create a new Google Translate provider
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TtsError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let audio_pattern = Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#)
            .map_err(|e| TtsError::ConfigError(e.to_string()))?;

        Ok(Self {
            tld: config.tld.trim_matches('.').to_string(),
            slow: config.slow,
            timeout_secs: config.timeout_secs,
            audio_pattern,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
            self.tld
        )
    }

    async fn synthesize_piece(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let payload = rpc_payload(text, language, self.slow);

        let response = self
            .client
            .post(self.endpoint())
            .header("Referer", format!("https://translate.google.{}/", self.tld))
            .form(&[("f.req", payload)])
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
            let message = response.text().await.unwrap_or_default();
            return Err(TtsError::ApiError {
                message: first_line(&message),
                status_code: Some(status.as_u16()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, self.timeout_secs))?;

        decode_audio_lines(&self.audio_pattern, &body)
    }
}

#[async_trait]
impl SpeechProvider for GoogleTranslateProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let pieces = split_request_text(&request.text, MAX_REQUEST_CHARS);
        if pieces.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let mut audio = Vec::new();
        for piece in &pieces {
            let bytes = self.synthesize_piece(piece, &request.language).await?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio(self.name().to_string()));
        }
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }

    fn audio_extension(&self) -> &'static str {
        "mp3"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }

    fn requests_for(&self, text: &str) -> usize {
        split_request_text(text, MAX_REQUEST_CHARS).len().max(1)
    }
}

/// Build the `f.req` form value for one piece of text.
fn rpc_payload(text: &str, language: &str, slow: bool) -> String {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let parameter = json!([text, language, speed, "null"]).to_string();
    json!([[[RPC_ID, parameter, Value::Null, "generic"]]]).to_string()
}

/// Pull the base64 audio out of every RPC line of a `batchexecute` response.
fn decode_audio_lines(pattern: &Regex, body: &str) -> Result<Vec<u8>> {
    let mut audio = Vec::new();

    for line in body.lines().filter(|line| line.contains(RPC_ID)) {
        let encoded = pattern
            .captures(line)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| TtsError::InvalidResponse {
                provider: "Google Translate".to_string(),
                message: format!("no audio in RPC line: {}", truncate(line, 120)),
            })?;

        let decoded = STANDARD
            .decode(encoded.as_str())
            .map_err(|e| TtsError::InvalidResponse {
                provider: "Google Translate".to_string(),
                message: format!("invalid base64 audio: {}", e),
            })?;
        audio.extend_from_slice(&decoded);
    }

    if audio.is_empty() {
        return Err(TtsError::EmptyAudio("Google Translate".to_string()));
    }
    Ok(audio)
}

/// Pack whitespace-separated words into pieces of at most `max_chars` chars.
///
/// Words longer than `max_chars` are cut at the character limit.
fn split_request_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();

        for part in chars.chunks(max_chars) {
            let part_len = part.len();
            if current_len > 0 && current_len + 1 + part_len > max_chars {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(part);
            current_len += part_len;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

fn first_line(message: &str) -> String {
    truncate(message.lines().next().unwrap_or_default(), 200)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
