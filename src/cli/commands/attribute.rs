//! Get and set command implementations.

use crate::cli::{parse_u16, parse_value};
use crate::core::config::Config;
use crate::core::device::Device;
use crate::service::{MessageRouterRequest, MessageRouterResponse, RequestPath};
use anyhow::Result;
use clap::Args;

/// Attribute address. Numbers accept `0x` hex.
#[derive(Args, Debug, Clone, Copy)]
pub struct PathArgs {
    /// Class code.
    #[arg(long, value_parser = parse_u16, default_value = "0x48")]
    pub class: u16,
    /// Instance number.
    #[arg(long, value_parser = parse_u16, default_value = "1")]
    pub instance: u16,
    /// Attribute number.
    #[arg(long, value_parser = parse_u16)]
    pub attribute: u16,
}

impl From<PathArgs> for RequestPath {
    fn from(args: PathArgs) -> Self {
        RequestPath::new(args.class, args.instance, args.attribute)
    }
}

/// Read one attribute.
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub path: PathArgs,
}

/// Write one attribute.
#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub path: PathArgs,
    /// Value, signed or unsigned, sent as a 32-bit little-endian integer.
    #[arg(long, value_parser = parse_value, allow_hyphen_values = true)]
    pub value: i64,
}

/// Printed after an accepted set.
pub const SET_NOTE: &str =
    "  configured value stored; it becomes active at the next power cycle (next cipattr invocation)";

/// Run the get command.
pub fn run_get(args: GetArgs, config: &Config) -> Result<()> {
    let mut device = Device::from_config(config)?;
    let path = RequestPath::from(args.path);
    let response = device.get_attribute_single(path);
    report(path, &response)
}

/// Run the set command.
pub fn run_set(args: SetArgs, config: &Config) -> Result<()> {
    let mut device = Device::from_config(config)?;
    let path = RequestPath::from(args.path);
    let request = MessageRouterRequest::set_attribute_single_raw(path, wire_value(args.value));
    let response = device.dispatch(&request);
    report(path, &response)?;
    println!("{}", SET_NOTE);
    Ok(())
}

fn wire_value(value: i64) -> Vec<u8> {
    (value as u32).to_le_bytes().to_vec()
}

fn report(path: RequestPath, response: &MessageRouterResponse) -> Result<()> {
    println!("{}", format_response(path, response));
    if !response.general_status.is_success() {
        anyhow::bail!("request failed: {}", response.general_status);
    }
    Ok(())
}

pub(crate) fn format_response(path: RequestPath, response: &MessageRouterResponse) -> String {
    let data = response
        .data
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}: reply 0x{:02x} status 0x{:02x} ({}) data [{}]",
        path,
        response.reply_service,
        response.general_status.code(),
        response.general_status,
        data
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GeneralStatus;
    use bytes::Bytes;

    #[test]
    fn response_line_shows_status_and_data() {
        let response = MessageRouterResponse {
            reply_service: 0x8E,
            general_status: GeneralStatus::Success,
            additional_status: Vec::new(),
            data: Bytes::from_static(&[0x37]),
        };
        let line = format_response(RequestPath::new(0x48, 1, 4), &response);
        assert_eq!(
            line,
            "class 0x48 / instance 1 / attribute 4: reply 0x8e status 0x00 (success) data [37]"
        );
    }

    #[test]
    fn wire_value_is_low_32_bits() {
        assert_eq!(wire_value(40), vec![40, 0, 0, 0]);
        assert_eq!(wire_value(-1), vec![0xFF; 4]);
        assert_eq!(wire_value(0xFFFF_FFFF), vec![0xFF; 4]);
        assert_eq!(wire_value(0x8000_0000), vec![0, 0, 0, 0x80]);
    }

    #[test]
    fn set_note_defers_to_next_power_cycle() {
        assert!(SET_NOTE.contains("next power cycle"));
        assert!(!SET_NOTE.contains("activate to apply"));
    }

    #[test]
    fn failed_status_is_an_error() {
        let response = MessageRouterResponse {
            reply_service: 0x90,
            general_status: GeneralStatus::InvalidAttributeValue,
            additional_status: Vec::new(),
            data: Bytes::new(),
        };
        assert!(report(RequestPath::new(0x48, 1, 4), &response).is_err());
    }
}
