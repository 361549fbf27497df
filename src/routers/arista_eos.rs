//! Recognizer for Arista EOS `show flow-spec ipv4` output.
//!
//! Each installed rule prints as one `Flow-spec rule:` block whose rule
//! text is a semicolon-separated condition list, followed by an action
//! (`Drop` or `Police: <rate>`) and a single `Counter:` trailer. The
//! platform reports no transmitted/dropped breakdown, so only the matched
//! counters are populated.
//!
//! ```text
//!   Flow-spec rule: 52.34.134.250/32;*;IP:=17;DP:=743;FRAG:2;
//!     ...
//!     Actions:
//!       Drop
//!     Status:
//!       Installed: yes
//!       Counter: 100 packets, 230 bytes
//! ```

use crate::error::ExtractError;
use crate::flowspec::{Action, FlowSpec};
use crate::terms::{parse_prefix, parse_rate_limit};
use crate::value::{parse_bitmask, parse_numeric_expression};
use regex::Regex;
use std::sync::LazyLock;

static RULE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^[ \t]*Flow-spec rule:[ \t]*(?P<rule>\S+)[ \t]*\r?\n",
        r"(?s:.*?)",
        r"^[ \t]*Actions:[ \t]*\r?\n",
        r"[ \t]*(?:(?P<drop>Drop)|Police:[ \t]*(?P<rate>\d+(?:\.\d+)?[ \t]*[A-Za-z]+))[ \t]*\r?\n",
        r"(?s:.*?)",
        r"^[ \t]*Counter:[ \t]*(?P<packets>\d+)[ \t]*packets,[ \t]*(?P<bytes>\d+)[ \t]*bytes",
    ))
    .expect("valid arista rule block pattern")
});

pub fn parse(data: &str) -> Result<Vec<FlowSpec>, ExtractError> {
    let mut flow_specs = Vec::new();

    for caps in RULE_BLOCK_RE.captures_iter(data) {
        let mut flow_spec = FlowSpec {
            raw: Some(caps[0].to_string()),
            matched_packets: Some(parse_counter(&caps["packets"])),
            matched_bytes: Some(parse_counter(&caps["bytes"])),
            ..Default::default()
        };

        parse_rule_terms(&caps["rule"], &mut flow_spec)?;

        if caps.name("drop").is_some() {
            flow_spec.action = Some(Action::Discard);
        } else if let Some(rate) = caps.name("rate") {
            flow_spec.action = Some(Action::RateLimit);
            flow_spec.rate_limit_bps = Some(parse_rate_limit(rate.as_str())?);
        }

        flow_specs.push(flow_spec);
    }

    Ok(flow_specs)
}

/// Parse the semicolon-separated rule text: destination and source prefix
/// first, then `KEY:value` condition terms.
fn parse_rule_terms(rule: &str, flow_spec: &mut FlowSpec) -> Result<(), ExtractError> {
    let mut fields = rule.split(';').filter(|f| !f.is_empty());

    // Transient malformed addresses appear in real captures; the field is
    // left absent rather than failing the extraction.
    if let Some(dst_text) = fields.next() {
        if let Ok(prefix) = parse_prefix(dst_text) {
            flow_spec.destination_prefix = prefix;
        }
    }
    if let Some(src_text) = fields.next() {
        if let Ok(prefix) = parse_prefix(src_text) {
            flow_spec.source_prefix = prefix;
        }
    }

    for term in fields {
        let Some((key, value)) = term.split_once(':') else {
            continue;
        };

        match key {
            "IP" => flow_spec.ip_protocol = Some(parse_numeric_expression(value)?),
            "DP" => flow_spec.destination_port = Some(parse_numeric_expression(value)?),
            "SP" => flow_spec.source_port = Some(parse_numeric_expression(value)?),
            "LEN" => flow_spec.packet_length = Some(parse_numeric_expression(value)?),
            "TCP" => flow_spec.tcp_flags = Some(parse_bitmask(value, 10, false)?),
            "FRAG" => flow_spec.fragment = Some(parse_bitmask(value, 10, false)?),
            _ => {}
        }
    }

    Ok(())
}

/// Counter captures are `\d+` groups; the parse cannot fail.
fn parse_counter(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}
