//! pdf-audio configuration management.

use anyhow::{Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tts_client::{ProviderConfig, ProviderKind};

const DEFAULT_CHUNK_SIZE: usize = 4000;
const DEFAULT_REQUEST_DELAY_SECS: f64 = 2.0;
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How per-chunk audio is combined into the final file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// ffmpeg when installed, otherwise stream concatenation if formats match
    #[default]
    Auto,
    /// Decode and re-encode every segment with ffmpeg
    Ffmpeg,
    /// Concatenate the encoded streams as-is (mp3 only)
    Concat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudiobookConfig {
    /// Maximum characters per synthesis request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between successive synthesis requests, in seconds
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: f64,

    /// Language code passed to the speech provider
    #[serde(default = "default_language")]
    pub language: String,

    /// Speech provider name (google-translate, openai)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Attempts per chunk before the run is aborted
    #[serde(default = "default_max_attempts", alias = "max_retries")]
    pub max_attempts: u32,

    /// How chunk audio is merged
    #[serde(default)]
    pub merge_strategy: MergeStrategy,

    /// Show completion notifications
    #[serde(default = "default_notifications")]
    pub notifications: bool,

    /// ffmpeg binary to use instead of the one on PATH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Speech provider settings
    #[serde(default)]
    pub tts: ProviderConfig,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_request_delay_secs() -> f64 {
    DEFAULT_REQUEST_DELAY_SECS
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_provider() -> String {
    ProviderKind::GoogleTranslate.as_str().to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_notifications() -> bool {
    true
}

impl Default for AudiobookConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            request_delay_secs: default_request_delay_secs(),
            language: default_language(),
            provider: default_provider(),
            max_attempts: default_max_attempts(),
            merge_strategy: MergeStrategy::default(),
            notifications: default_notifications(),
            ffmpeg_path: None,
            tts: ProviderConfig::default(),
        }
    }
}

impl AudiobookConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf-audio.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("pdf-audio.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: AudiobookConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than 0");
        }
        if !self.request_delay_secs.is_finite() || self.request_delay_secs < 0.0 {
            bail!(
                "request_delay_secs must be a non-negative number, got {}",
                self.request_delay_secs
            );
        }
        if self.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        if self.language.trim().is_empty() {
            bail!("language must not be empty");
        }
        if self.tts.timeout_secs == 0 {
            bail!("tts.timeout_secs must be greater than 0");
        }
        ProviderKind::from_str(&self.provider)?;
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs.max(0.0))
    }
}
