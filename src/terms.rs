//! Term parsers shared by the vendor recognizers: address prefixes and
//! rate-limit literals.

use crate::error::ExtractError;
use ipnet::IpNet;
use std::net::IpAddr;

/// The token vendors print for "any address".
const WILDCARD: &str = "*";

/// Parse an address prefix term.
///
/// The wildcard token maps to `None` ("no constraint"). Dotted-quad
/// addresses with fewer than four octets, which some vendors print for
/// compactness, are zero-extended to a full address before the mask is
/// interpreted. A bare address gets a full-length mask. Host bits below the
/// mask are truncated, matching how the routers themselves normalize
/// prefixes.
pub fn parse_prefix(text: &str) -> Result<Option<IpNet>, ExtractError> {
    if text == WILDCARD {
        return Ok(None);
    }

    let (addr_text, mask_text) = match text.split_once('/') {
        Some((addr, mask)) => (addr.to_string(), Some(mask)),
        None => (text.to_string(), None),
    };

    let addr_text = if addr_text.contains('.') && !addr_text.contains(':') {
        expand_partial_octets(&addr_text)
    } else {
        addr_text
    };

    let addr: IpAddr = addr_text
        .parse()
        .map_err(|_| ExtractError::InvalidPrefix(text.to_string()))?;

    let prefix_len = match mask_text {
        Some(mask) => mask
            .parse::<u8>()
            .map_err(|_| ExtractError::InvalidPrefix(text.to_string()))?,
        None if addr.is_ipv4() => 32,
        None => 128,
    };

    let net =
        IpNet::new(addr, prefix_len).map_err(|_| ExtractError::InvalidPrefix(text.to_string()))?;
    Ok(Some(net.trunc()))
}

/// Zero-extend a dotted-quad address with implied trailing octets,
/// e.g. `10.1` becomes `10.1.0.0`.
fn expand_partial_octets(addr: &str) -> String {
    let mut octets: Vec<&str> = addr.split('.').collect();
    while octets.len() < 4 {
        octets.push("0");
    }
    octets.join(".")
}

/// Parse a rate-limit literal into bits per second.
///
/// Covers every vendor spelling: Cisco `5242880 bps`, Juniper `6291k`,
/// Arista `1.5 Mbps`. Units are decimal powers, never binary; decimal
/// literals are permitted and the product is rounded to the nearest
/// integer.
pub fn parse_rate_limit(text: &str) -> Result<u64, ExtractError> {
    let text = text.trim();
    let unit_start = text
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(text.len());
    let (number_text, unit_text) = text.split_at(unit_start);

    let number: f64 = number_text
        .parse()
        .map_err(|_| ExtractError::InvalidUnit(text.to_string()))?;

    let multiplier = match unit_text.trim().to_ascii_lowercase().as_str() {
        "" | "bps" => 1.0,
        "k" | "kbps" => 1_000.0,
        "m" | "mbps" => 1_000_000.0,
        "g" | "gbps" => 1_000_000_000.0,
        other => return Err(ExtractError::InvalidUnit(other.to_string())),
    };

    Ok((number * multiplier).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_is_absent_not_an_error() {
        assert_eq!(parse_prefix("*").unwrap(), None);
    }

    #[test]
    fn test_full_prefix() {
        let net = parse_prefix("134.34.2.128/25").unwrap().unwrap();
        assert_eq!(net.to_string(), "134.34.2.128/25");
    }

    #[test]
    fn test_bare_address_gets_host_mask() {
        let net = parse_prefix("39.244.131.7").unwrap().unwrap();
        assert_eq!(net.to_string(), "39.244.131.7/32");
    }

    #[test]
    fn test_partial_octets_are_zero_extended() {
        let net = parse_prefix("10.1/16").unwrap().unwrap();
        assert_eq!(net.to_string(), "10.1.0.0/16");

        let net = parse_prefix("172.16.5/24").unwrap().unwrap();
        assert_eq!(net.to_string(), "172.16.5.0/24");
    }

    #[test]
    fn test_host_bits_are_truncated() {
        let net = parse_prefix("134.34.2.200/25").unwrap().unwrap();
        assert_eq!(net.to_string(), "134.34.2.128/25");
    }

    #[test]
    fn test_malformed_address_is_rejected() {
        let err = parse_prefix("300.1.2.3/32").unwrap_err();
        assert_eq!(err, ExtractError::InvalidPrefix("300.1.2.3/32".to_string()));

        let err = parse_prefix("10.0.0.0/99").unwrap_err();
        assert_eq!(err, ExtractError::InvalidPrefix("10.0.0.0/99".to_string()));
    }

    #[test]
    fn test_rate_limit_vendor_spellings() {
        assert_eq!(parse_rate_limit("5242880 bps").unwrap(), 5242880);
        assert_eq!(parse_rate_limit("6291k").unwrap(), 6_291_000);
        assert_eq!(parse_rate_limit("6291K").unwrap(), 6_291_000);
        assert_eq!(parse_rate_limit("1.5 Mbps").unwrap(), 1_500_000);
        assert_eq!(parse_rate_limit("2 Gbps").unwrap(), 2_000_000_000);
        assert_eq!(parse_rate_limit("0").unwrap(), 0);
    }

    #[test]
    fn test_decimal_literal_rounds_to_nearest() {
        assert_eq!(parse_rate_limit("5.5k").unwrap(), 5_500);
        assert_eq!(parse_rate_limit("1.2345k").unwrap(), 1_235);
    }

    #[test]
    fn test_unknown_unit_is_rejected() {
        let err = parse_rate_limit("100 pps").unwrap_err();
        assert_eq!(err, ExtractError::InvalidUnit("pps".to_string()));
    }
}
