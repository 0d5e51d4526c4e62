//! Reset command implementation.

use crate::core::config::Config;
use crate::core::device::{Device, ResetType};
use anyhow::Result;
use clap::Args;

/// Restore factory defaults, persist them and activate.
#[derive(Args, Debug)]
pub struct ResetArgs {}

/// Run the reset command (identity reset type 1).
pub fn run_reset(_args: ResetArgs, config: &Config) -> Result<()> {
    let mut device = Device::from_config(config)?;
    let reset = ResetType::FactoryDefaults;
    let status = device.identity_reset(reset);
    println!("Identity reset type {} applied (NV {})", reset as u8, status);
    println!("Active DSCP: {:?}", device.dscp().snapshot());
    if !status.is_ok() {
        anyhow::bail!("failed to persist one or more objects");
    }
    Ok(())
}
