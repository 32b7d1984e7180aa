//! Speech provider implementations

mod google_translate;
pub mod mock;
mod openai;

pub use google_translate::GoogleTranslateProvider;
pub use mock::MockProvider;
pub use openai::OpenAiSpeechProvider;

use crate::config::ProviderConfig;
use crate::error::{Result, TtsError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    GoogleTranslate,
    OpenAi,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google-translate" | "google_translate" | "google" | "gtts" => Ok(Self::GoogleTranslate),
            "openai" | "open-ai" => Ok(Self::OpenAi),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Canonical name used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleTranslate => "google-translate",
            Self::OpenAi => "openai",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::GoogleTranslate => None,
            Self::OpenAi => Some("OPENAI_API_KEY"),
        }
    }
}

/// Create a provider instance from its name and config
pub fn get_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn SpeechProvider>> {
    let kind = ProviderKind::from_str(name)?;

    match kind {
        ProviderKind::GoogleTranslate => Ok(Box::new(GoogleTranslateProvider::new(config)?)),
        ProviderKind::OpenAi => {
            let api_key = get_api_key(config, kind, "OpenAI")?;
            Ok(Box::new(OpenAiSpeechProvider::new(config, api_key)?))
        }
    }
}

/// Get API key from config or the provider's environment variable
fn get_api_key(config: &ProviderConfig, kind: ProviderKind, provider_name: &str) -> Result<String> {
    if let Some(key) = config.api_key.clone() {
        return Ok(key);
    }

    let env_var = kind.env_var().ok_or_else(|| {
        TtsError::ConfigError(format!("{} does not use an API key", provider_name))
    })?;

    std::env::var(env_var).map_err(|_| TtsError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}

/// Map a reqwest failure onto the provider error type.
pub(crate) fn request_error(error: reqwest::Error, timeout_secs: u64) -> TtsError {
    if error.is_timeout() {
        TtsError::Timeout(timeout_secs)
    } else {
        TtsError::ApiError {
            message: format!("Request failed: {}", error),
            status_code: None,
        }
    }
}

/// Parse a `Retry-After` header given in seconds.
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
