//! Show command implementation.

use crate::core::config::Config;
use crate::core::device::{AttributeEntry, Device};
use crate::object::AttributeDescriptor;
use crate::qos::{DscpValues, QOS_CLASS_CODE, QOS_INSTANCE};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

/// Show configured and active QoS values.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Serialize)]
struct QosReport {
    device: String,
    nv_status: String,
    configured: Vec<AttributeRow>,
    active: DscpValues,
}

#[derive(Debug, Serialize)]
struct AttributeRow {
    attribute: u16,
    data_type: String,
    access: String,
    range: [i64; 2],
    value: Option<String>,
}

impl From<&AttributeEntry> for AttributeRow {
    fn from(entry: &AttributeEntry) -> Self {
        let descriptor = &entry.descriptor;
        Self {
            attribute: descriptor.number,
            data_type: descriptor.data_type.to_string(),
            access: access_label(descriptor),
            range: [descriptor.range.min, descriptor.range.max],
            value: entry.value.as_ref().map(|v| v.to_string()),
        }
    }
}

/// Run the show command.
pub fn run_show(args: ShowArgs, config: &Config) -> Result<()> {
    let device = Device::from_config(config)?;
    let entries = device
        .attributes(QOS_CLASS_CODE, QOS_INSTANCE)
        .context("QoS instance not registered")?;

    let report = QosReport {
        device: device.name().to_string(),
        nv_status: device.boot_status().to_string(),
        configured: entries.iter().map(AttributeRow::from).collect(),
        active: device.dscp().snapshot(),
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text(&report),
        other => anyhow::bail!("unknown format: {} (expected text or json)", other),
    }
    Ok(())
}

fn print_text(report: &QosReport) {
    println!("Device: {} (NV {})", report.device, report.nv_status);
    println!();
    println!("Configured (class 0x{:02x}, instance {}):", QOS_CLASS_CODE, QOS_INSTANCE);
    println!("  {:<5} {:<6} {:<12} {:<8} {}", "ATTR", "TYPE", "ACCESS", "RANGE", "VALUE");
    for row in &report.configured {
        println!(
            "  {:<5} {:<6} {:<12} {:<8} {}",
            row.attribute,
            row.data_type,
            row.access,
            format!("{}..{}", row.range[0], row.range[1]),
            row.value.as_deref().unwrap_or("-")
        );
    }
    println!();

    let active = &report.active;
    println!("Active DSCP:");
    println!("  event     {}", active.event);
    println!("  general   {}", active.general);
    println!("  urgent    {}", active.urgent);
    println!("  scheduled {}", active.scheduled);
    println!("  high      {}", active.high);
    println!("  low       {}", active.low);
    println!("  explicit  {}", active.explicit);
}

fn access_label(descriptor: &AttributeDescriptor) -> String {
    let mut parts = Vec::new();
    if descriptor.is_gettable() {
        parts.push("get");
    }
    if descriptor.is_settable() {
        parts.push("set");
    }
    if descriptor.is_nv() {
        parts.push("nv");
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(",")
    }
}
