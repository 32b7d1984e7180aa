use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Unexpected response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Refusing to synthesize empty text")]
    EmptyText,

    #[error("{0} returned no audio")]
    EmptyAudio(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TtsError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TtsError::RateLimited { .. } | TtsError::Timeout(_) => true,
            TtsError::ApiError { status_code, .. } => {
                status_code.is_none_or(|code| code == 429 || code >= 500)
            }
            TtsError::InvalidResponse { .. } | TtsError::EmptyAudio(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
