//! Configuration system for trails.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{TrailsError, TrailsResult};

/// Default API root of a locally running study server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Length of the flip/advance animation in milliseconds.
    pub transition_delay_ms: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 20,
            transition_delay_ms: 300,
            user_agent: concat!("trails/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TrailsResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| TrailsError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| TrailsError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| TrailsError::Configuration(e.to_string()))?,
            _ => {
                return Err(TrailsError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; malformed numbers are ignored
    /// with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TRAILS_API_URL") {
            config.base_url = url;
        }
        if let Some(secs) = env_u64("TRAILS_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Some(ms) = env_u64("TRAILS_TRANSITION_DELAY_MS") {
            config.transition_delay_ms = ms;
        }

        config
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check the base URL and timeout.
    pub fn validate(&self) -> TrailsResult<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            TrailsError::Configuration(format!("Invalid base_url '{}': {}", self.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TrailsError::Configuration(format!(
                "base_url must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(TrailsError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    /// `base_url` joined with `path`, without doubled slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            None
        }
    }
}

/// Builder for ClientConfig.
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Set the animation delay.
    pub fn transition_delay_ms(mut self, ms: u64) -> Self {
        self.config.transition_delay_ms = ms;
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
