//! The normalized, vendor-independent flow-spec record and its canonical
//! match-condition key.

use crate::value::{BitmaskValue, NumericValue};
use ipnet::IpNet;
use serde::Serialize;
use std::fmt;

/// Disposition a router applies to traffic matching a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Accept,
    Discard,
    RateLimit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept => f.write_str("accept"),
            Action::Discard => f.write_str("discard"),
            Action::RateLimit => f.write_str("rate-limit"),
        }
    }
}

/// One parsed flow-spec filter rule with its traffic counters.
///
/// Every field is independently optional: absence means "no constraint on
/// this attribute" for match conditions and "not reported by this vendor"
/// for counters. Records are immutable once a recognizer constructs them;
/// the Juniper reconciliation stage builds new merged records instead of
/// mutating.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowSpec {
    /// The exact source substring this record was parsed from. Diagnostic
    /// anchor only; excluded from equality and serialization.
    #[serde(skip)]
    pub raw: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_prefix: Option<IpNet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_prefix: Option<IpNet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_protocol: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_length: Option<NumericValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscp: Option<NumericValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_flags: Option<BitmaskValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<BitmaskValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Present iff `action` is `RateLimit`; integer bits per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_bps: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_packets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmitted_packets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmitted_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_packets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropped_bytes: Option<u64>,
}

impl PartialEq for FlowSpec {
    /// `raw` is a debug anchor and never participates in comparison.
    fn eq(&self, other: &Self) -> bool {
        self.destination_prefix == other.destination_prefix
            && self.source_prefix == other.source_prefix
            && self.ip_protocol == other.ip_protocol
            && self.port == other.port
            && self.destination_port == other.destination_port
            && self.source_port == other.source_port
            && self.icmp_type == other.icmp_type
            && self.icmp_code == other.icmp_code
            && self.packet_length == other.packet_length
            && self.dscp == other.dscp
            && self.tcp_flags == other.tcp_flags
            && self.fragment == other.fragment
            && self.action == other.action
            && self.rate_limit_bps == other.rate_limit_bps
            && self.matched_packets == other.matched_packets
            && self.matched_bytes == other.matched_bytes
            && self.transmitted_packets == other.transmitted_packets
            && self.transmitted_bytes == other.transmitted_bytes
            && self.dropped_packets == other.dropped_packets
            && self.dropped_bytes == other.dropped_bytes
    }
}

impl Eq for FlowSpec {}

impl FlowSpec {
    /// Deterministic string key over every present match-condition field.
    ///
    /// Counters, action and rate are never part of the key: it must identify
    /// "the same logical filter" across report sections and scrape cycles,
    /// including a plain counter row and a policer row for one filter.
    pub fn canonical_key(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(net) = &self.destination_prefix {
            parts.push(format!("dst:{net}"));
        }
        if let Some(net) = &self.source_prefix {
            parts.push(format!("src:{net}"));
        }
        if let Some(value) = &self.ip_protocol {
            parts.push(format!("proto:{value}"));
        }
        if let Some(value) = &self.port {
            parts.push(format!("port:{value}"));
        }
        if let Some(value) = &self.destination_port {
            parts.push(format!("dstport:{value}"));
        }
        if let Some(value) = &self.source_port {
            parts.push(format!("srcport:{value}"));
        }
        if let Some(value) = &self.icmp_type {
            parts.push(format!("icmp-type:{value}"));
        }
        if let Some(value) = &self.icmp_code {
            parts.push(format!("icmp-code:{value}"));
        }
        if let Some(value) = &self.packet_length {
            parts.push(format!("len:{value}"));
        }
        if let Some(value) = &self.dscp {
            parts.push(format!("dscp:{value}"));
        }
        if let Some(value) = &self.tcp_flags {
            parts.push(format!("tcp-flags:{value}"));
        }
        if let Some(value) = &self.fragment {
            parts.push(format!("frag:{value}"));
        }

        parts.join(",")
    }
}
