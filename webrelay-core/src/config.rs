use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub delivery: DeliveryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Outbound delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Whole-request timeout for one delivery
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    /// Deliveries in flight at once within one publication
    pub max_concurrent: usize,
    pub user_agent: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            max_concurrent: 16,
            user_agent: concat!("webrelay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DeliveryConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration with priority:
    /// 1. Config file (if provided)
    /// 2. Defaults (lowest priority)
    ///
    /// The format is picked from the file extension (yaml, toml, json).
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from file path
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check values that deserialize fine but cannot run.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.is_empty() {
            errors.push("server.host must not be empty".to_string());
        }
        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be non-zero".to_string());
        }
        if self.delivery.timeout_seconds == 0 {
            errors.push("delivery.timeout_seconds must be non-zero".to_string());
        }
        if self.delivery.connect_timeout_seconds == 0 {
            errors.push("delivery.connect_timeout_seconds must be non-zero".to_string());
        }
        if self.delivery.max_concurrent == 0 {
            errors.push("delivery.max_concurrent must be at least 1".to_string());
        }
        if crate::logging::parse_log_level(&self.logging.level).is_err() {
            errors.push(format!("logging.level '{}' is not a valid level", self.logging.level));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            errors.push(format!(
                "logging.format '{}' must be 'pretty' or 'json'",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
