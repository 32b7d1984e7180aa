use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a speech provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// Trait for text-to-speech providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request text and return the encoded audio bytes
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// File extension of the audio this provider returns (without the dot)
    fn audio_extension(&self) -> &'static str;

    /// Check if the provider is available (API key set, etc.)
    fn is_available(&self) -> Result<()>;

    /// Number of HTTP requests `synthesize` makes for `text`.
    ///
    /// Each request gets the configured timeout, so callers bounding a
    /// whole `synthesize` call scale their limit by this count.
    fn requests_for(&self, _text: &str) -> usize {
        1
    }
}
