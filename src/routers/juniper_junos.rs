//! Recognizer for Juniper JUNOS `show firewall filter detail` output, plus
//! the counter-reconciliation pass its layout requires.
//!
//! JUNOS reports one logical filter across two tables: `Counters:` rows
//! carry the plain match-condition hits, `Policers:` rows carry the hits
//! against the same filter's rate limiter. The only cross-reference between
//! them is the match-condition text itself, so rows are merged by canonical
//! key after recognition.
//!
//! ```text
//! Filter: __flowspec_default_inet__
//! Counters:
//! Name                                                  Bytes     Packets
//! 39.244.131.7,*,dstport=443,tcp-flag:18,len=180        395784    6780
//! Policers:
//! Name                                                  Bytes     Packets
//! 6291K_11.194.71.7,*,dstport=40,=50,=60,>=70&<=80      100568357 94618
//! ```
//!
//! A row's leading `<number><k|m|g>_` prefix is what makes it a policer
//! row; the tables share one row pattern otherwise.

use crate::error::ExtractError;
use crate::flowspec::{Action, FlowSpec};
use crate::terms::{parse_prefix, parse_rate_limit};
use crate::value::{parse_bitmask, parse_numeric_expression};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<name>\S+,\S+)[ \t]+(?P<bytes>\d+)[ \t]+(?P<packets>\d+)[ \t\r]*$")
        .expect("valid junos table row pattern")
});

static RATE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<rate>\d+(?:\.\d+)?[kKmMgG])_").expect("valid junos rate prefix pattern")
});

pub fn parse(data: &str) -> Result<Vec<FlowSpec>, ExtractError> {
    check_section_order(data)?;

    let mut rows = Vec::new();

    for caps in ROW_RE.captures_iter(data) {
        let mut name = &caps["name"];

        let mut flow_spec = FlowSpec {
            raw: Some(caps[0].to_string()),
            matched_bytes: Some(parse_counter(&caps["bytes"])),
            matched_packets: Some(parse_counter(&caps["packets"])),
            ..Default::default()
        };

        if let Some(rate_caps) = RATE_PREFIX_RE.captures(name) {
            let rate_text = &rate_caps["rate"];
            flow_spec.action = Some(Action::RateLimit);
            flow_spec.rate_limit_bps = Some(parse_rate_limit(rate_text)?);
            name = &name[rate_caps[0].len()..];
        } else {
            // A plain counters row reports traffic that hit the filter under
            // its default disposition; until a policer row for the same key
            // says otherwise, matched traffic counts as dropped.
            flow_spec.action = Some(Action::Discard);
            flow_spec.dropped_bytes = flow_spec.matched_bytes;
            flow_spec.dropped_packets = flow_spec.matched_packets;
        }

        parse_match_conditions(name, &mut flow_spec)?;
        rows.push(flow_spec);
    }

    Ok(reconcile(rows))
}

/// The merge direction assumes `Counters:` rows precede `Policers:` rows,
/// as every observed firmware prints them. A capture that reverses the
/// sections would silently invert transmitted/dropped, so the ordering is
/// checked instead of assumed. A new `Filter:` header resets the check.
fn check_section_order(data: &str) -> Result<(), ExtractError> {
    let mut seen_policers = false;

    for line in data.lines() {
        let line = line.trim();
        if line.starts_with("Filter:") {
            seen_policers = false;
        } else if line == "Policers:" {
            seen_policers = true;
        } else if line == "Counters:" && seen_policers {
            return Err(ExtractError::MisorderedSections);
        }
    }

    Ok(())
}

/// Parse the row's name field: `dst,src` then comma-separated condition
/// terms. A comma followed by a letter starts a new term; a comma followed
/// by an operator continues the current numeric expression.
fn parse_match_conditions(name: &str, flow_spec: &mut FlowSpec) -> Result<(), ExtractError> {
    // The row pattern guarantees at least one comma.
    let Some((dst_text, rest)) = name.split_once(',') else {
        return Ok(());
    };

    // Transient malformed addresses appear in real captures; the field is
    // left absent rather than failing the extraction.
    if let Ok(prefix) = parse_prefix(dst_text) {
        flow_spec.destination_prefix = prefix;
    }

    let mut fields = split_name_fields(rest).into_iter();

    if let Some(src_text) = fields.next() {
        if let Ok(prefix) = parse_prefix(src_text) {
            flow_spec.source_prefix = prefix;
        }
    }

    for term in fields {
        let key_len = term
            .chars()
            .take_while(|c| c.is_ascii_lowercase() || *c == '-')
            .count();
        let (key, value) = term.split_at(key_len);

        match key {
            "proto" => flow_spec.ip_protocol = Some(parse_numeric_expression(value)?),
            "port" => flow_spec.port = Some(parse_numeric_expression(value)?),
            "dstport" => flow_spec.destination_port = Some(parse_numeric_expression(value)?),
            "srcport" => flow_spec.source_port = Some(parse_numeric_expression(value)?),
            "icmp-type" => flow_spec.icmp_type = Some(parse_numeric_expression(value)?),
            "icmp-code" => flow_spec.icmp_code = Some(parse_numeric_expression(value)?),
            "len" => flow_spec.packet_length = Some(parse_numeric_expression(value)?),
            "dscp" => flow_spec.dscp = Some(parse_numeric_expression(value)?),
            "tcp-flag" | "frag" => {
                let Some(hex) = value.strip_prefix(':') else {
                    return Err(ExtractError::InvalidBitmask(term.to_string()));
                };
                let (negate, hex) = match hex.strip_prefix('!') {
                    Some(stripped) => (true, stripped),
                    None => (false, hex),
                };
                let mask = parse_bitmask(hex, 16, negate)?;
                if key == "tcp-flag" {
                    flow_spec.tcp_flags = Some(mask);
                } else {
                    flow_spec.fragment = Some(mask);
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn split_name_fields(rest: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (i, c) in rest.char_indices() {
        if c == ','
            && rest[i + 1..]
                .chars()
                .next()
                .is_some_and(|next| next.is_ascii_alphabetic())
        {
            parts.push(&rest[start..i]);
            start = i + 1;
        }
    }
    parts.push(&rest[start..]);

    parts
}

/// Counter captures are `\d+` groups; the parse cannot fail.
fn parse_counter(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}

/// Merge the two counter families reported for one logical filter.
///
/// Rows are processed in document order with a map from canonical key to
/// the most recent sighting. A policer row whose key was already seen takes
/// the prior row's matched counters as its transmitted counters and adds
/// them into its own matched counters, so matched = transmitted + dropped.
/// Only the final row per key survives, in first-seen key order.
fn reconcile(rows: Vec<FlowSpec>) -> Vec<FlowSpec> {
    let mut key_order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, FlowSpec> = HashMap::new();

    for row in rows {
        let key = row.canonical_key();
        if !latest.contains_key(&key) {
            key_order.push(key.clone());
        }

        let record = if row.action == Some(Action::RateLimit) {
            match latest.get(&key) {
                Some(prior) => merge_policed(row, prior),
                None => row,
            }
        } else {
            row
        };

        latest.insert(key, record);
    }

    key_order
        .into_iter()
        .filter_map(|key| latest.remove(&key))
        .collect()
}

fn merge_policed(policed: FlowSpec, prior: &FlowSpec) -> FlowSpec {
    FlowSpec {
        transmitted_bytes: prior.matched_bytes,
        transmitted_packets: prior.matched_packets,
        dropped_bytes: policed.matched_bytes,
        dropped_packets: policed.matched_packets,
        matched_bytes: sum_counters(policed.matched_bytes, prior.matched_bytes),
        matched_packets: sum_counters(policed.matched_packets, prior.matched_packets),
        ..policed
    }
}

fn sum_counters(own: Option<u64>, prior: Option<u64>) -> Option<u64> {
    match (own, prior) {
        (Some(a), Some(b)) => Some(a + b),
        (Some(a), None) => Some(a),
        (None, prior) => prior,
    }
}
