//! Command-line interface.
//!
//! Every invocation is one power cycle: it boots a device from the
//! configuration (loading NV records or storing defaults, then activating),
//! performs one operation and prints the result. Values written by `set`
//! become active at the next invocation.

pub mod commands;

use crate::core::config::{Config, ConfigOverrides, TelemetryConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

/// Configuration file used when `--config` is not given, if present.
pub const DEFAULT_CONFIG_PATH: &str = "cipattr.toml";

/// cipattr - CIP attribute access and configuration commit.
#[derive(Parser, Debug)]
#[command(name = "cipattr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Storage backend (file, memory).
    #[arg(long, global = true)]
    pub storage_backend: Option<String>,

    /// NV record directory.
    #[arg(long, global = true)]
    pub storage_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Overrides carried by the global flags.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            log_level: self.log_level.clone(),
            storage_backend: self.storage_backend.clone(),
            storage_dir: self.storage_dir.clone(),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read one attribute (Get_Attribute_Single).
    Get(commands::GetArgs),
    /// Write one attribute (Set_Attribute_Single).
    Set(commands::SetArgs),
    /// Show configured and active QoS values.
    Show(commands::ShowArgs),
    /// Restore factory defaults (identity reset type 1).
    Reset(commands::ResetArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}

/// Load the configuration file (or defaults) and apply CLI overrides.
pub fn load_config(path: Option<&str>, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(Path::new(path))
            .with_context(|| format!("failed to load config from {}", path))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => Config::default(),
    };
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

/// Install the tracing subscriber. `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(telemetry: &TelemetryConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries command output.
    let result = if telemetry.log_format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer, optionally negative.
pub fn parse_int(input: &str) -> Result<i64, String> {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|e| format!("invalid number '{}': {}", input, e))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a class, instance or attribute number.
pub fn parse_u16(input: &str) -> Result<u16, String> {
    let value = parse_int(input)?;
    u16::try_from(value).map_err(|_| format!("{} does not fit in 16 bits", input))
}

/// Parse a Set_Attribute_Single value: any signed or unsigned 32-bit integer.
pub fn parse_value(input: &str) -> Result<i64, String> {
    let value = parse_int(input)?;
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return Err(format!("{} does not fit in 32 bits", input));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_hex_and_decimal() {
        assert_eq!(parse_u16("0x48"), Ok(0x48));
        assert_eq!(parse_u16("0X48"), Ok(0x48));
        assert_eq!(parse_u16("72"), Ok(72));
        assert_eq!(parse_value("-1"), Ok(-1));
        assert_eq!(parse_value("0x100"), Ok(256));
        assert_eq!(parse_value("0xFFFFFFFF"), Ok(0xFFFF_FFFF));
        assert_eq!(parse_value("-2147483648"), Ok(i64::from(i32::MIN)));
    }

    #[test]
    fn numbers_reject_garbage_and_overflow() {
        assert!(parse_u16("qos").is_err());
        assert!(parse_u16("0x10000").is_err());
        assert!(parse_u16("-1").is_err());
        assert!(parse_value("0x100000000").is_err());
        assert!(parse_value("4294967296").is_err());
        assert!(parse_value("-2147483649").is_err());
    }

    #[test]
    fn cli_parses_set_with_globals() {
        let cli = Cli::try_parse_from([
            "cipattr",
            "--storage-backend",
            "memory",
            "set",
            "--class",
            "0x48",
            "--instance",
            "1",
            "--attribute",
            "4",
            "--value",
            "40",
        ])
        .unwrap();
        assert_eq!(cli.overrides().storage_backend.as_deref(), Some("memory"));
        match cli.command {
            Commands::Set(args) => {
                assert_eq!(args.path.class, 0x48);
                assert_eq!(args.value, 40);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn no_separate_activate_command() {
        assert!(Cli::try_parse_from(["cipattr", "activate"]).is_err());
        assert!(Cli::try_parse_from(["cipattr", "reset"]).is_ok());
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let err = load_config(Some("/nonexistent/cipattr.toml"), &ConfigOverrides::default());
        assert!(err.is_err());
    }

    #[test]
    fn overrides_are_validated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cipattr.toml");
        std::fs::write(&path, "[storage]\nbackend = \"memory\"\n").unwrap();
        let overrides = ConfigOverrides {
            log_level: Some("loud".to_string()),
            ..Default::default()
        };
        assert!(load_config(path.to_str(), &overrides).is_err());
    }
}
