use crate::error::{GridError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the image generation endpoint.
#[derive(Debug, Clone, Default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY").ok().filter(|v| !v.trim().is_empty());
        let base_url = env::var("GEMINI_BASE_URL").ok().filter(|v| !v.trim().is_empty());
        let model = env::var("GEMINI_IMAGE_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let timeout_secs = env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok());

        GeminiConfig {
            api_key,
            base_url,
            model,
            timeout_secs,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GridError::ConfigError("API key is required".into()))
    }

    /// Base URL without a trailing slash; falls back to the public endpoint
    /// when unset or blank.
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_endpoint() {
        let config = GeminiConfig::new();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model(), DEFAULT_IMAGE_MODEL);
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn blank_base_url_falls_back_and_trailing_slash_is_trimmed() {
        assert_eq!(
            GeminiConfig::new().with_base_url("   ").base_url(),
            DEFAULT_BASE_URL
        );
        assert_eq!(
            GeminiConfig::new()
                .with_base_url("http://localhost:8317/v1beta/")
                .base_url(),
            "http://localhost:8317/v1beta"
        );
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        assert!(matches!(
            GeminiConfig::new().api_key(),
            Err(GridError::ConfigError(_))
        ));
        assert!(matches!(
            GeminiConfig::new().with_api_key("  ").api_key(),
            Err(GridError::ConfigError(_))
        ));
        assert_eq!(
            GeminiConfig::new().with_api_key("k-123").api_key(),
            Ok("k-123")
        );
    }
}
