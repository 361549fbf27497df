//! Per-vendor recognizers that locate every filter's textual block inside a
//! command-output capture and map it to a normalized [`FlowSpec`] record.
//!
//! The platform set is closed and known at build time, so dispatch is a
//! match over the [`Platform`] tag rather than any runtime lookup. Each
//! recognizer is a pure, synchronous function over the capture text; a
//! capture with no recognizable blocks yields an empty list, never an
//! error.

pub mod arista_eos;
pub mod cisco_ios;
pub mod juniper_junos;

use crate::error::ExtractError;
use crate::flowspec::FlowSpec;
use clap::ValueEnum;
use std::str::FromStr;

/// Router platforms this engine can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    /// Cisco IOS XR `show flowspec` detail output
    CiscoIos,
    /// Juniper JUNOS firewall filter Counters/Policers tables
    JuniperJunos,
    /// Arista EOS `show flow-spec` output
    AristaEos,
}

impl Platform {
    /// The vendor CLI command whose output this recognizer reads. Retained
    /// for traceability alongside extracted records; never parsed.
    pub fn default_command(&self) -> &'static str {
        match self {
            Platform::CiscoIos => "show flowspec vrf all ipv4 detail",
            Platform::JuniperJunos => "show firewall filter detail __flowspec_default_inet__",
            Platform::AristaEos => "show flow-spec ipv4",
        }
    }
}

impl FromStr for Platform {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "cisco-ios" => Ok(Platform::CiscoIos),
            "juniper-junos" => Ok(Platform::JuniperJunos),
            "arista-eos" => Ok(Platform::AristaEos),
            _ => Err(ExtractError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Extract every flow-spec rule found in `data` for the given platform.
///
/// `command` is the literal CLI command the capture came from; it travels
/// with the call for traceability only and is never parsed.
pub fn parse_flow_spec(
    platform: Platform,
    data: &str,
    _command: Option<&str>,
) -> Result<Vec<FlowSpec>, ExtractError> {
    match platform {
        Platform::CiscoIos => cisco_ios::parse(data),
        Platform::JuniperJunos => juniper_junos::parse(data),
        Platform::AristaEos => arista_eos::parse(data),
    }
}
