// File: hostclean-core/src/validators.rs
//! Programmatic validation for candidate spans found by the category regexes.
//!
//! Regular expressions only find things that look like an address. The
//! functions here apply structural checks on top of that (octet ranges,
//! real IPv6 parsing, consistent MAC separators) and inspect the characters
//! around a candidate so that version strings and identifiers are not
//! mistaken for addresses.
//!
//! License: MIT OR APACHE 2.0

use std::net::Ipv6Addr;
use std::str::FromStr;

/// Checks a dotted quad: exactly four decimal octets, each 0-255, and no
/// octet longer than three digits.
pub fn is_valid_ipv4_programmatically(candidate: &str) -> bool {
    let mut parts = candidate.split('.');
    let (Some(a), Some(b), Some(c), Some(d), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    [a, b, c, d].iter().all(|octet| {
        !octet.is_empty()
            && octet.len() <= 3
            && octet.bytes().all(|b| b.is_ascii_digit())
            && octet.parse::<u16>().map_or(false, |n| n <= 255)
    })
}

/// Rejects IPv4 candidates that are really part of a longer dotted token.
///
/// `before` and `after` are the text immediately left and right of the
/// candidate. `1.2.3.4.5`, `v10.0.0.1` and `10.0.0.1a` are rejected;
/// `ip=10.0.0.1,` and `10.0.0.1.` at the end of a sentence are accepted.
pub fn ipv4_context_is_clean(before: &str, after: &str) -> bool {
    let prev = before.chars().next_back();
    let mut next_chars = after.chars();
    let next = next_chars.next();
    let next_next = next_chars.next();

    if let Some(p) = prev {
        if p.is_ascii_alphanumeric() || p == '_' {
            return false;
        }
        if p == '.' {
            let before_dot = before[..before.len() - 1].chars().next_back();
            if before_dot.map_or(false, |c| c.is_ascii_alphanumeric()) {
                return false;
            }
        }
    }
    if let Some(n) = next {
        if n.is_ascii_alphanumeric() || n == '_' {
            return false;
        }
        if n == '.' && next_next.map_or(false, |c| c.is_ascii_digit()) {
            return false;
        }
    }
    true
}

/// Parses the candidate as an IPv6 address (full or `::`-compressed).
/// Zone identifiers are not accepted.
pub fn is_valid_ipv6_programmatically(candidate: &str) -> bool {
    candidate.bytes().any(|b| b.is_ascii_hexdigit()) && Ipv6Addr::from_str(candidate).is_ok()
}

/// Rejects IPv6 candidates glued to identifier characters (`std::fs`,
/// `a1::b2x`). A single `:` next to the candidate is accepted as a field
/// separator (`host:fe80::1`, `fe80::1: link down`) unless the address
/// visibly continues past it.
pub fn ipv6_context_is_clean(before: &str, after: &str) -> bool {
    let ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let continues = |c: Option<char>| c.map_or(false, |c| c.is_ascii_hexdigit() || c == ':');

    let mut left = before.chars().rev();
    let prev_ok = match left.next() {
        None => true,
        Some(':') => !continues(left.next()),
        Some(c) => !ident(c),
    };
    let mut right = after.chars();
    let next_ok = match right.next() {
        None => true,
        Some(':') => !continues(right.next()),
        Some(c) => !ident(c),
    };
    prev_ok && next_ok
}

/// Six hex octets separated consistently by `:` or `-`.
pub fn is_valid_mac_programmatically(candidate: &str) -> bool {
    if candidate.len() != 17 {
        return false;
    }
    let Some(sep) = candidate.chars().nth(2) else {
        return false;
    };
    if sep != ':' && sep != '-' {
        return false;
    }
    candidate.split(sep).count() == 6
        && candidate
            .split(sep)
            .all(|octet| octet.len() == 2 && octet.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Generic word boundary check used for MAC addresses.
pub fn token_context_is_clean(before: &str, after: &str) -> bool {
    let bad = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '-';
    !before.chars().next_back().map_or(false, bad) && !after.chars().next().map_or(false, bad)
}

/// Boundary check for hostnames: the match must not be part of a longer
/// DNS label or a longer dotted name on its left.
pub fn hostname_context_is_clean(before: &str, after: &str) -> bool {
    let label_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    let prev_ok = !before
        .chars()
        .next_back()
        .map_or(false, |c| label_char(c) || c == '.');
    let next_ok = !after.chars().next().map_or(false, label_char);
    prev_ok && next_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_octet_ranges() {
        assert!(is_valid_ipv4_programmatically("10.0.2.155"));
        assert!(is_valid_ipv4_programmatically("255.255.255.255"));
        assert!(!is_valid_ipv4_programmatically("256.1.1.1"));
        assert!(!is_valid_ipv4_programmatically("1.2.3"));
        assert!(!is_valid_ipv4_programmatically("1.2.3.4.5"));
        assert!(!is_valid_ipv4_programmatically("1.2.3.0004"));
    }

    #[test]
    fn test_ipv4_context() {
        assert!(ipv4_context_is_clean("ip: ", ""));
        assert!(ipv4_context_is_clean("(", ")."));
        assert!(!ipv4_context_is_clean("1.", ""));
        assert!(!ipv4_context_is_clean("v", ""));
        assert!(!ipv4_context_is_clean("", ".7"));
        assert!(!ipv4_context_is_clean("", "x"));
    }

    #[test]
    fn test_ipv6_validation() {
        assert!(is_valid_ipv6_programmatically("abcd::1"));
        assert!(is_valid_ipv6_programmatically("fe80:0:0:0:202:b3ff:fe1e:8329"));
        assert!(!is_valid_ipv6_programmatically("::"));
        assert!(!is_valid_ipv6_programmatically("12:34:56"));
        assert!(!is_valid_ipv6_programmatically("00:1a:2b:3c:4d:5e"));
    }

    #[test]
    fn test_ipv6_context_separator_colon() {
        assert!(ipv6_context_is_clean("host:", ""));
        assert!(ipv6_context_is_clean("from ", ": link down"));
        assert!(ipv6_context_is_clean("[", "]:22"));
        assert!(!ipv6_context_is_clean("st", ""));
        assert!(!ipv6_context_is_clean("", "x"));
        assert!(!ipv6_context_is_clean("1:", ""));
        assert!(!ipv6_context_is_clean("", "::"));
    }

    #[test]
    fn test_mac_validation() {
        assert!(is_valid_mac_programmatically("00:1a:2B:3c:4d:5e"));
        assert!(is_valid_mac_programmatically("00-1a-2b-3c-4d-5e"));
        assert!(!is_valid_mac_programmatically("00:1a-2b:3c:4d:5e"));
        assert!(!is_valid_mac_programmatically("00:1a:2b:3c:4d"));
    }

    #[test]
    fn test_hostname_context() {
        assert!(hostname_context_is_clean("host ", " up"));
        assert!(hostname_context_is_clean("", "."));
        assert!(!hostname_context_is_clean("www.", ""));
        assert!(!hostname_context_is_clean("", "ing"));
    }
}
