//! Config command implementation.

use crate::core::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration.
    Validate,
    /// Print the effective configuration with defaults.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Run the config command against an already loaded and validated configuration.
pub fn run_config(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => {
            config.validate()?;
            println!("✓ Configuration valid");
            println!("  storage: {} ({})", config.storage.backend, config.storage.dir);
            println!(
                "  telemetry: {} / {}",
                config.telemetry.log_level, config.telemetry.log_format
            );
            Ok(())
        }
        ConfigCommand::Show { format } => {
            println!("{}", render(config, &format)?);
            Ok(())
        }
    }
}

fn render(config: &Config, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "toml" => Ok(toml::to_string_pretty(config)?),
        other => anyhow::bail!("unknown format: {} (expected toml or json)", other),
    }
}
