//! IP address literals to and from their unsigned integer form.
//!
//! `0` is the reserved "no address" value and maps to the literal `"0"` in
//! both directions. IPv6 fields also accept dotted-quad literals, stored as
//! IPv4-mapped addresses and rendered back in dotted-quad form.

use std::net::{Ipv4Addr, Ipv6Addr};

use trace_model::AddressFamily;

/// Parses an address literal into its integer form.
///
/// Returns `None` if the literal is not valid for `family`.
pub fn encode_address(literal: &str, family: AddressFamily) -> Option<u128> {
    let literal = literal.trim();
    if literal == "0" {
        return Some(0);
    }
    match family {
        AddressFamily::V4 => literal
            .parse::<Ipv4Addr>()
            .ok()
            .map(|addr| u128::from(u32::from(addr))),
        AddressFamily::V6 => match literal.parse::<Ipv6Addr>() {
            Ok(addr) => Some(u128::from(addr)),
            Err(_) => literal
                .parse::<Ipv4Addr>()
                .ok()
                .map(|addr| u128::from(addr.to_ipv6_mapped())),
        },
    }
}

/// Formats an integer as an address literal.
///
/// Returns `None` if the value does not fit the family.
pub fn decode_address(value: u128, family: AddressFamily) -> Option<String> {
    if value == 0 {
        return Some("0".to_string());
    }
    match family {
        AddressFamily::V4 => u32::try_from(value)
            .ok()
            .map(|v| Ipv4Addr::from(v).to_string()),
        AddressFamily::V6 => {
            let addr = Ipv6Addr::from(value);
            Some(match addr.to_ipv4_mapped() {
                Some(v4) => v4.to_string(),
                None => addr.to_string(),
            })
        }
    }
}

/// Parses a generated address cell. Integral float spellings (`"3232235521.0"`)
/// are accepted.
pub fn parse_address_integer(text: &str) -> Option<u128> {
    let text = text.trim();
    if let Ok(value) = text.parse::<u128>() {
        return Some(value);
    }
    let (whole, fraction) = text.split_once('.')?;
    if fraction.chars().all(|c| c == '0') {
        whole.parse::<u128>().ok()
    } else {
        None
    }
}
