//! Shared encoding and name-matching utilities.

use std::net::IpAddr;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Compare a certificate name against a hostname.
///
/// ASCII letters compare case-insensitively, every other byte must match
/// exactly. A leading `*.` label matches exactly one non-empty label of the
/// hostname, and only when at least two labels follow the wildcard.
pub fn hostname_matches(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.strip_suffix('.').unwrap_or(pattern);
    let hostname = hostname.strip_suffix('.').unwrap_or(hostname);
    if pattern.is_empty() || hostname.is_empty() {
        return false;
    }

    if let Some(suffix) = pattern.strip_prefix("*.") {
        if !suffix.contains('.') || suffix.contains('*') {
            return false;
        }
        return match hostname.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest.eq_ignore_ascii_case(suffix),
            None => false,
        };
    }

    !pattern.contains('*') && pattern.eq_ignore_ascii_case(hostname)
}

/// Match a hostname (or IP literal) against a certificate's names.
///
/// IP literals are compared with the iPAddress SAN entries only. DNS names
/// are compared with the dNSName SAN entries; the subject common name is
/// consulted only when the certificate has no dNSName entries at all.
pub fn verify_hostname_match(
    dns_names: &[String],
    ip_addresses: &[IpAddr],
    common_name: Option<&str>,
    hostname: &str,
) -> bool {
    if let Some(ip) = parse_ip_literal(hostname) {
        return ip_addresses.iter().any(|san| *san == ip);
    }

    if !dns_names.is_empty() {
        return dns_names
            .iter()
            .any(|pattern| hostname_matches(pattern, hostname));
    }

    common_name.is_some_and(|cn| hostname_matches(cn, hostname))
}

/// Parse an IPv4 or IPv6 literal, accepting `[v6]` brackets.
pub fn parse_ip_literal(s: &str) -> Option<IpAddr> {
    let trimmed = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);
    trimmed.parse().ok()
}

/// Check whether input data looks like PEM (starts with "-----BEGIN").
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}
