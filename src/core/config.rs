//! Configuration parsing and validation.
//!
//! Device configuration is loaded from a TOML file with CLI overrides.
//! Every section is optional; an empty file yields a file-backed device
//! storing NV records under `nvdata/`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Device identity.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Non-volatile storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Device identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name used in log output.
    #[serde(default = "default_device_name")]
    pub name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
        }
    }
}

/// Non-volatile storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: "file" or "memory".
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Record directory for the file backend.
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            dir: default_storage_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// Default value functions

fn default_device_name() -> String {
    "cipattr".to_string()
}

fn default_storage_backend() -> String {
    "file".to_string()
}

fn default_storage_dir() -> String {
    "nvdata".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref backend) = overrides.storage_backend {
            self.storage.backend = backend.clone();
        }
        if let Some(ref dir) = overrides.storage_dir {
            self.storage.dir = dir.clone();
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_storage()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_storage(&self) -> Result<()> {
        match self.storage.backend.as_str() {
            "memory" => Ok(()),
            "file" => {
                if self.storage.dir.trim().is_empty() {
                    anyhow::bail!("storage.dir required for the file backend");
                }
                Ok(())
            }
            other => anyhow::bail!("storage.backend must be 'file' or 'memory', got: {}", other),
        }
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }

        if self.telemetry.log_format != "text" && self.telemetry.log_format != "json" {
            anyhow::bail!(
                "telemetry.log_format must be 'text' or 'json', got: {}",
                self.telemetry.log_format
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Override storage backend.
    pub storage_backend: Option<String>,
    /// Override storage directory.
    pub storage_dir: Option<String>,
}
