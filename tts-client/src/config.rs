use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (for API providers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Top-level domain of the Google Translate host (com, co.uk, ...)
    #[serde(default = "default_tld")]
    pub tld: String,

    /// Ask for the slower reading speed where the provider supports it
    #[serde(default)]
    pub slow: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tld() -> String {
    "com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            tld: default_tld(),
            slow: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.tld, "com");
        assert!(!config.slow);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: ProviderConfig = toml::from_str("tld = \"co.uk\"\nslow = true").unwrap();
        assert_eq!(config.tld, "co.uk");
        assert!(config.slow);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_api_key_not_serialized_when_absent() {
        let toml_str = toml::to_string_pretty(&ProviderConfig::default()).unwrap();
        assert!(!toml_str.contains("api_key"));
        assert!(toml_str.contains("tld = \"com\""));
    }
}
