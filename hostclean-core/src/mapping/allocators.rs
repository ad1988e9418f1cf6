//! Per-category allocators that hand out obfuscated stand-ins.
//!
//! Allocators only produce candidates. Uniqueness and "never equal to the
//! original" are enforced by the registry that owns them, which asks again
//! with the next `attempt` number when a candidate is rejected.
//!
//! License: MIT OR APACHE 2.0

use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::fmt;

use crate::category::Category;
use crate::errors::CleanerError;

type HmacSha256 = Hmac<Sha256>;

/// Suffix appended to every obfuscated fully qualified hostname.
pub const HOSTNAME_SUFFIX: &str = ".example.com";
const HOSTNAME_LABEL_LEN: usize = 12;

/// First address handed out by the IPv4 allocator.
pub const IPV4_START: [u8; 4] = [10, 230, 230, 1];

pub trait Allocator: Send + fmt::Debug {
    /// Produces a candidate stand-in for `original`.
    ///
    /// `attempt` starts at 0 and grows each time the registry rejects the
    /// previous candidate for the same original.
    fn allocate(&mut self, original: &str, attempt: u32) -> Result<String, CleanerError>;
}

/// The 12 hex character SHA-1 label of a hostname.
pub fn hostname_label(hostname: &str) -> String {
    let digest = Sha1::digest(hostname.as_bytes());
    let mut label = hex::encode(digest);
    label.truncate(HOSTNAME_LABEL_LEN);
    label
}

/// Pure hostname obfuscation: `report.test.com` -> `f9fe0db0c046.example.com`.
pub fn obfuscate_hostname(hostname: &str) -> String {
    format!("{}{}", hostname_label(hostname), HOSTNAME_SUFFIX)
}

/// Stateless: the result only depends on the original and the configured
/// canonical hostname.
#[derive(Debug, Default)]
pub struct HostnameAllocator {
    canonical: Option<String>,
}

impl HostnameAllocator {
    pub fn new(canonical: Option<&str>) -> Self {
        Self {
            canonical: canonical.map(str::to_string),
        }
    }

    fn short_name(&self) -> Option<&str> {
        let fqdn = self.canonical.as_deref()?;
        let (short, rest) = fqdn.split_once('.')?;
        (!short.is_empty() && !rest.is_empty()).then_some(short)
    }
}

impl Allocator for HostnameAllocator {
    fn allocate(&mut self, original: &str, _attempt: u32) -> Result<String, CleanerError> {
        if let (Some(short), Some(fqdn)) = (self.short_name(), self.canonical.as_deref()) {
            if original.eq_ignore_ascii_case(short) {
                // The bare host name shares the label of its FQDN.
                return Ok(hostname_label(fqdn));
            }
        }
        Ok(obfuscate_hostname(original))
    }
}

/// Sequential allocator over `10.230.230.1` onwards, skipping `.0` and
/// `.255` in the last octet.
#[derive(Debug)]
pub struct Ipv4Allocator {
    cursor: Option<[u8; 4]>,
}

impl Default for Ipv4Allocator {
    fn default() -> Self {
        Self {
            cursor: Some(IPV4_START),
        }
    }
}

impl Ipv4Allocator {
    fn advance(current: [u8; 4]) -> Option<[u8; 4]> {
        let [a, mut b, mut c, mut d] = current;
        if d < 254 {
            d += 1;
            return Some([a, b, c, d]);
        }
        d = 1;
        if c < 255 {
            c += 1;
            return Some([a, b, c, d]);
        }
        c = 0;
        if b < 255 {
            b += 1;
            return Some([a, b, c, d]);
        }
        None
    }
}

impl Allocator for Ipv4Allocator {
    fn allocate(&mut self, original: &str, _attempt: u32) -> Result<String, CleanerError> {
        let current = self
            .cursor
            .ok_or_else(|| CleanerError::AllocationExhausted(Category::Ipv4, original.to_string()))?;
        self.cursor = Self::advance(current);
        let [a, b, c, d] = current;
        Ok(format!("{}.{}.{}.{}", a, b, c, d))
    }
}

/// Keyed-hash IPv6 allocator.
///
/// Every hex digit of the original is replaced with a digit drawn from
/// HMAC-SHA256(run seed, original || attempt). Separators stay in place and
/// an all-uppercase address stays uppercase, so the output has the original's
/// exact character length and shape.
pub struct Ipv6Allocator {
    run_seed: Vec<u8>,
}

impl fmt::Debug for Ipv6Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ipv6Allocator").finish_non_exhaustive()
    }
}

impl Ipv6Allocator {
    pub fn new(run_seed: &[u8]) -> Self {
        Self {
            run_seed: run_seed.to_vec(),
        }
    }

    fn nibbles(&self, original: &str, attempt: u32) -> Result<Vec<u8>, CleanerError> {
        let mut mac = HmacSha256::new_from_slice(&self.run_seed)
            .map_err(|e| CleanerError::Fatal(format!("Failed to create HMAC from run seed: {}", e)))?;
        mac.update(original.as_bytes());
        mac.update(&attempt.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(digest.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect())
    }
}

impl Allocator for Ipv6Allocator {
    fn allocate(&mut self, original: &str, attempt: u32) -> Result<String, CleanerError> {
        let nibbles = self.nibbles(original, attempt)?;
        let mut next = nibbles.iter().cycle();
        let upper = original.chars().any(|c| c.is_ascii_uppercase())
            && !original.chars().any(|c| c.is_ascii_lowercase());
        let out = original
            .chars()
            .map(|ch| {
                if !ch.is_ascii_hexdigit() {
                    return ch;
                }
                let nibble = next.next().copied().unwrap_or(0);
                let digit = char::from_digit(u32::from(nibble), 16).unwrap_or('0');
                if upper {
                    digit.to_ascii_uppercase()
                } else {
                    digit
                }
            })
            .collect();
        Ok(out)
    }
}

/// Counter allocator under the locally administered `02:00:00` prefix.
#[derive(Debug)]
pub struct MacAllocator {
    counter: u32,
}

impl Default for MacAllocator {
    fn default() -> Self {
        Self { counter: 1 }
    }
}

impl Allocator for MacAllocator {
    fn allocate(&mut self, original: &str, _attempt: u32) -> Result<String, CleanerError> {
        const MAX_COUNTER: u32 = 0x00ff_ffff;
        if self.counter > MAX_COUNTER {
            return Err(CleanerError::AllocationExhausted(Category::Mac, original.to_string()));
        }
        let n = self.counter;
        self.counter += 1;

        let sep = if original.contains('-') { "-" } else { ":" };
        let octets = [0x02, 0x00, 0x00, (n >> 16) as u8, (n >> 8) as u8, n as u8];
        let upper = original.chars().any(|c| c.is_ascii_uppercase());
        Ok(octets
            .iter()
            .map(|o| if upper { format!("{:02X}", o) } else { format!("{:02x}", o) })
            .collect::<Vec<_>>()
            .join(sep))
    }
}

/// `keyword0`, `keyword1`, ... in first-encounter order.
#[derive(Debug, Default)]
pub struct KeywordAllocator {
    counter: usize,
}

impl Allocator for KeywordAllocator {
    fn allocate(&mut self, _original: &str, _attempt: u32) -> Result<String, CleanerError> {
        let out = format!("keyword{}", self.counter);
        self.counter += 1;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_is_pure_and_matches_known_label() {
        assert_eq!(obfuscate_hostname("report.test.com"), "f9fe0db0c046.example.com");
        let mut a = HostnameAllocator::new(Some("report.test.com"));
        let mut b = HostnameAllocator::new(None);
        assert_eq!(
            a.allocate("report.test.com", 0).unwrap(),
            b.allocate("report.test.com", 7).unwrap()
        );
    }

    #[test]
    fn test_hostname_short_name_shares_label() {
        let mut alloc = HostnameAllocator::new(Some("report.test.com"));
        assert_eq!(alloc.allocate("report", 0).unwrap(), "f9fe0db0c046");
    }

    #[test]
    fn test_ipv4_rolls_into_next_block() {
        let mut alloc = Ipv4Allocator {
            cursor: Some([10, 230, 230, 254]),
        };
        assert_eq!(alloc.allocate("x", 0).unwrap(), "10.230.230.254");
        assert_eq!(alloc.allocate("y", 0).unwrap(), "10.230.231.1");
    }

    #[test]
    fn test_ipv4_exhaustion() {
        let mut alloc = Ipv4Allocator {
            cursor: Some([10, 255, 255, 254]),
        };
        assert!(alloc.allocate("x", 0).is_ok());
        assert!(matches!(
            alloc.allocate("y", 0),
            Err(CleanerError::AllocationExhausted(Category::Ipv4, _))
        ));
    }

    #[test]
    fn test_ipv6_preserves_shape_and_is_keyed() {
        let mut alloc = Ipv6Allocator::new(b"seed-one");
        let first = alloc.allocate("ABCD::1", 0).unwrap();
        assert_eq!(first.len(), "ABCD::1".len());
        assert_eq!(&first[4..6], "::");
        assert!(first.chars().all(|c| !c.is_ascii_lowercase()));
        assert_eq!(first, alloc.allocate("ABCD::1", 0).unwrap());

        let mut other = Ipv6Allocator::new(b"seed-two");
        let retried = alloc.allocate("ABCD::1", 1).unwrap();
        let reseeded = other.allocate("ABCD::1", 0).unwrap();
        assert!(retried != first || reseeded != first);
    }

    #[test]
    fn test_mac_preserves_separator_and_case() {
        let mut alloc = MacAllocator::default();
        assert_eq!(alloc.allocate("00:1a:2b:3c:4d:5e", 0).unwrap(), "02:00:00:00:00:01");
        assert_eq!(alloc.allocate("00-1A-2B-3C-4D-5E", 0).unwrap(), "02-00-00-00-00-02");
    }

    #[test]
    fn test_keyword_counter() {
        let mut alloc = KeywordAllocator::default();
        assert_eq!(alloc.allocate("testword", 0).unwrap(), "keyword0");
        assert_eq!(alloc.allocate("other", 0).unwrap(), "keyword1");
    }
}
