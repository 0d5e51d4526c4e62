//! cipattr - command-line entrypoint.
//!
//! Usage:
//!   cipattr get --attribute 4
//!   cipattr set --class 0x48 --instance 1 --attribute 4 --value 40
//!   cipattr show [--format json]
//!   cipattr reset
//!   cipattr config validate --config cipattr.toml

use anyhow::Result;
use cipattr::cli::commands::{run_config, run_get, run_reset, run_set, run_show};
use cipattr::cli::{init_tracing, load_config, Cli, Commands};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), &cli.overrides())?;
    init_tracing(&config.telemetry);

    match cli.command {
        Commands::Get(args) => run_get(args, &config),
        Commands::Set(args) => run_set(args, &config),
        Commands::Show(args) => run_show(args, &config),
        Commands::Reset(args) => run_reset(args, &config),
        Commands::Config(args) => run_config(args, &config),
    }
}
