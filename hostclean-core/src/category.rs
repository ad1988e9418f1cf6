//! Obfuscation categories and their naming conventions.
//!
//! Every sensitive value the cleaner substitutes belongs to exactly one
//! `Category`. The category decides which allocator hands out stand-ins,
//! what the CSV report is called and which keys it occupies in the facts
//! document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hostname,
    Ipv4,
    Ipv6,
    Mac,
    Keyword,
}

impl Category {
    /// Substitution priority: most specific and contextual first.
    pub const PRIORITY: [Category; 5] = [
        Category::Hostname,
        Category::Ipv4,
        Category::Ipv6,
        Category::Mac,
        Category::Keyword,
    ];

    /// Suffix used in `<archive_name>-<slug>.csv`.
    pub fn report_slug(self) -> &'static str {
        match self {
            Category::Hostname => "hostname",
            Category::Ipv4 => "ip",
            Category::Ipv6 => "ipv6",
            Category::Mac => "mac",
            Category::Keyword => "keyword",
        }
    }

    /// Human readable name used in CSV headers.
    pub fn label(self) -> &'static str {
        match self {
            Category::Hostname => "Hostname",
            Category::Ipv4 => "IPv4",
            Category::Ipv6 => "IPv6",
            Category::Mac => "MAC",
            Category::Keyword => "Keyword",
        }
    }

    /// Name used in facts keys and in `obfuscation_list`.
    pub fn facts_slug(self) -> &'static str {
        match self {
            Category::Hostname => "hostname",
            Category::Ipv4 => "ipv4",
            Category::Ipv6 => "ipv6",
            Category::Mac => "mac",
            Category::Keyword => "keyword",
        }
    }

    /// CSV header of the category's report, obfuscated column first.
    ///
    /// Every category uses this shape. Legacy keyword reports were headed
    /// `Replaced Keyword,Original Keyword` with the original value in the
    /// first column; that layout is not reproduced.
    pub fn report_header(self) -> [String; 2] {
        [
            format!("Obfuscated {}", self.label()),
            format!("Original {}", self.label()),
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.facts_slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hostname" => Ok(Category::Hostname),
            "ipv4" | "ip" => Ok(Category::Ipv4),
            "ipv6" => Ok(Category::Ipv6),
            "mac" => Ok(Category::Mac),
            "keyword" => Ok(Category::Keyword),
            other => Err(format!("unknown obfuscation category '{}'", other)),
        }
    }
}
