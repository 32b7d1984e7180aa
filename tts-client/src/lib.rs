//! Shared text-to-speech client library for the pdf-audio workspace
//!
//! Provides a unified interface for speech synthesis providers:
//! - Google Translate (key-less, MP3 output)
//! - OpenAI speech API
//! - Mock provider for tests

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::ProviderConfig;
pub use error::{Result, TtsError};
pub use provider::{SpeechProvider, SpeechRequest};
pub use providers::{MockProvider, ProviderKind, get_provider};
