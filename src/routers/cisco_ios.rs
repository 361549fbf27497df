//! Recognizer for Cisco IOS XR `show flowspec vrf all ipv4 detail` output.
//!
//! Each installed filter prints as one block: a `Flow` condition line, an
//! `Actions` line and a `Statistics` section. `Matched` is always present;
//! `Transmitted`/`Dropped` appear only when the platform differentiates
//! them, and stay absent (not zero) otherwise.
//!
//! ```text
//!   Flow           :Dest:27.146.73.155/32,Proto:=6,DPort:=443,TCPFlags:~0x10,Frag:~IsF
//!     Actions      :Traffic-rate: 5242880 bps  (bgp.1)
//!     Statistics                        (packets/bytes)
//!       Matched             :                1376/63296
//!       Transmitted         :                1376/63296
//!       Dropped             :                   0/0
//! ```

use crate::error::ExtractError;
use crate::flowspec::{Action, FlowSpec};
use crate::terms::{parse_prefix, parse_rate_limit};
use crate::value::{BitmaskValue, parse_bitmask, parse_numeric_expression};
use regex::Regex;
use std::sync::LazyLock;

static FLOW_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*Flow[ \t]+:(?P<flow>\S+)[ \t]*\r?\n",
        r"[ \t]*Actions[ \t]+:(?P<actions>[^\r\n]+)\r?\n",
        r"[ \t]*Statistics[^\r\n]*\r?\n",
        r"[ \t]*Matched[ \t]*:[ \t]*(?P<matched_packets>\d+)/(?P<matched_bytes>\d+)[ \t]*(?:\r?\n|$)",
        r"(?:[ \t]*Transmitted[ \t]*:[ \t]*(?P<transmitted_packets>\d+)/(?P<transmitted_bytes>\d+)[ \t]*(?:\r?\n|$))?",
        r"(?:[ \t]*Dropped[ \t]*:[ \t]*(?P<dropped_packets>\d+)/(?P<dropped_bytes>\d+))?",
    ))
    .expect("valid cisco flow block pattern")
});

static TRAFFIC_RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Traffic-rate:[ \t]*(?P<rate>\d+(?:\.\d+)?(?:[ \t]*[A-Za-z]+)?)")
        .expect("valid traffic rate pattern")
});

pub fn parse(data: &str) -> Result<Vec<FlowSpec>, ExtractError> {
    let mut flow_specs = Vec::new();

    for caps in FLOW_BLOCK_RE.captures_iter(data) {
        let mut flow_spec = FlowSpec {
            raw: Some(caps[0].to_string()),
            ..Default::default()
        };

        for term in split_condition_terms(&caps["flow"]) {
            let Some((label, value)) = term.split_once(':') else {
                continue;
            };

            // Cisco output is considered strict: a malformed address here is
            // a hard failure, unlike on Juniper/Arista.
            match label {
                "Dest" => flow_spec.destination_prefix = parse_prefix(value)?,
                "Source" => flow_spec.source_prefix = parse_prefix(value)?,
                "Proto" => flow_spec.ip_protocol = Some(parse_numeric_expression(value)?),
                "DPort" => flow_spec.destination_port = Some(parse_numeric_expression(value)?),
                "SPort" => flow_spec.source_port = Some(parse_numeric_expression(value)?),
                "Length" => flow_spec.packet_length = Some(parse_numeric_expression(value)?),
                "TCPFlags" => {
                    let hex = value
                        .strip_prefix("~0x")
                        .or_else(|| value.strip_prefix("0x"))
                        .unwrap_or(value);
                    flow_spec.tcp_flags = Some(parse_bitmask(hex, 16, false)?);
                }
                "Frag" => flow_spec.fragment = Some(parse_fragment_tokens(value)?),
                _ => {}
            }
        }

        let actions = caps["actions"].trim();
        if actions.starts_with("transmit") {
            flow_spec.action = Some(Action::Accept);
        } else if let Some(rate_caps) = TRAFFIC_RATE_RE.captures(actions) {
            let rate = parse_rate_limit(&rate_caps["rate"])?;
            if rate == 0 {
                flow_spec.action = Some(Action::Discard);
            } else {
                flow_spec.action = Some(Action::RateLimit);
                flow_spec.rate_limit_bps = Some(rate);
            }
        }
        // Redirect actions are matched as block delimiters but carry no
        // disposition this model represents; the field stays absent.

        flow_spec.matched_packets = Some(parse_counter(&caps["matched_packets"]));
        flow_spec.matched_bytes = Some(parse_counter(&caps["matched_bytes"]));

        if let (Some(packets), Some(bytes)) = (
            caps.name("transmitted_packets"),
            caps.name("transmitted_bytes"),
        ) {
            flow_spec.transmitted_packets = Some(parse_counter(packets.as_str()));
            flow_spec.transmitted_bytes = Some(parse_counter(bytes.as_str()));
        }
        if let (Some(packets), Some(bytes)) =
            (caps.name("dropped_packets"), caps.name("dropped_bytes"))
        {
            flow_spec.dropped_packets = Some(parse_counter(packets.as_str()));
            flow_spec.dropped_bytes = Some(parse_counter(bytes.as_str()));
        }

        flow_specs.push(flow_spec);
    }

    Ok(flow_specs)
}

/// Counter captures are `\d+` groups; the parse cannot fail.
fn parse_counter(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}

/// Split the `Flow` condition segment on commas that begin a new `Key:`
/// term. Commas inside a numeric expression are followed by an operator
/// token, not a label, and stay within the current term.
fn split_condition_terms(flow: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (i, c) in flow.char_indices() {
        if c == ',' && starts_new_term(&flow[i + 1..]) {
            parts.push(&flow[start..i]);
            start = i + 1;
        }
    }
    parts.push(&flow[start..]);

    parts
}

fn starts_new_term(rest: &str) -> bool {
    let label_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    label_len > 0 && rest[label_len..].starts_with(':')
}

/// Map `~`-prefixed fragment tokens onto their wire-encoding bits and
/// combine them into one non-negated bitmask.
fn parse_fragment_tokens(value: &str) -> Result<BitmaskValue, ExtractError> {
    let mut mask = 0u64;

    for token in value.split('~').filter(|t| !t.is_empty()) {
        mask |= match token {
            "DF" => 0x01,
            "IsF" => 0x02,
            "FF" => 0x04,
            "LF" => 0x08,
            _ => return Err(ExtractError::InvalidBitmask(token.to_string())),
        };
    }

    Ok(BitmaskValue {
        mask,
        negate: false,
    })
}
