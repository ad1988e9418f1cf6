//! Locates category spans and drop-pattern hits inside a single line.
//!
//! Fixed category regexes are compiled once into process-wide statics. The
//! hostname and keyword regexes depend on the run configuration and are
//! built once when the [`PatternMatcher`] is constructed. Every regex hit is
//! then run through the programmatic checks in [`crate::validators`].
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::Arc;

use crate::category::Category;
use crate::errors::CleanerError;
use crate::sanitizers::compiler::CompiledPatterns;
use crate::validators;

const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("static IPv4 regex must compile")
});

static IPV6_CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]*:[0-9a-f:]*:[0-9a-f]*").expect("static IPv6 regex must compile")
});

static MAC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{2}(?:[:-][0-9a-f]{2}){5}\b").expect("static MAC regex must compile")
});

/// One accepted match. `original` is the value to register in the mapping
/// store, which for hostnames is the canonical spelling rather than the
/// matched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanMatch {
    pub range: Range<usize>,
    pub original: String,
}

#[derive(Debug)]
struct HostnameMatcher {
    regex: Regex,
    fqdn: String,
    short: Option<String>,
}

impl HostnameMatcher {
    fn new(hostname: &str) -> Result<Option<Self>, CleanerError> {
        let fqdn = hostname.trim().trim_end_matches('.').to_string();
        if fqdn.is_empty() {
            return Ok(None);
        }
        let short = fqdn
            .split_once('.')
            .map(|(s, _)| s.to_string())
            .filter(|s| !s.is_empty());

        // FQDN first so it wins over its own short name at the same offset.
        let mut alternatives = vec![regex::escape(&fqdn)];
        if let Some(s) = &short {
            alternatives.push(regex::escape(s));
        }
        let pattern = format!("(?:{})", alternatives.join("|"));
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| CleanerError::PatternCompilation(pattern.clone(), e))?;

        Ok(Some(Self { regex, fqdn, short }))
    }

    fn canonical_for(&self, matched: &str) -> String {
        if matched.eq_ignore_ascii_case(&self.fqdn) {
            return self.fqdn.clone();
        }
        match &self.short {
            Some(short) if matched.eq_ignore_ascii_case(short) => short.clone(),
            _ => matched.to_string(),
        }
    }
}

/// Matcher for every category plus the run's drop patterns.
#[derive(Debug)]
pub struct PatternMatcher {
    hostname: Option<HostnameMatcher>,
    keywords: Option<Regex>,
    drop_patterns: Arc<CompiledPatterns>,
}

impl PatternMatcher {
    pub fn new(
        canonical_hostname: Option<&str>,
        keywords: &[String],
        drop_patterns: Arc<CompiledPatterns>,
    ) -> Result<Self, CleanerError> {
        let hostname = match canonical_hostname {
            Some(h) => HostnameMatcher::new(h)?,
            None => None,
        };

        let mut literals: Vec<&str> = keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect();
        // Longest first: alternation is leftmost-first, so this yields the
        // longest keyword at any given offset.
        literals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        literals.dedup();
        let keywords = if literals.is_empty() {
            None
        } else {
            let pattern = literals
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let regex = RegexBuilder::new(&pattern)
                .size_limit(REGEX_SIZE_LIMIT)
                .build()
                .map_err(|e| CleanerError::PatternCompilation("<keywords>".to_string(), e))?;
            Some(regex)
        };

        debug!(
            "PatternMatcher ready: hostname={}, keywords={}, drop_patterns={}",
            hostname.is_some(),
            literals.len(),
            drop_patterns.len()
        );

        Ok(Self {
            hostname,
            keywords,
            drop_patterns,
        })
    }

    /// Returns the first drop pattern matching `line`, if any.
    pub fn drop_match(&self, line: &str) -> Option<&str> {
        self.drop_patterns.first_match(line)
    }

    pub fn has_drop_patterns(&self) -> bool {
        !self.drop_patterns.is_empty()
    }

    /// Finds all non-overlapping matches of `category` inside `line[window]`.
    ///
    /// Context checks look at the whole line, so a window boundary never
    /// makes a longer token look like a standalone match.
    pub fn find(&self, category: Category, line: &str, window: Range<usize>) -> Vec<SpanMatch> {
        let Some(haystack) = line.get(window.clone()) else {
            return Vec::new();
        };
        let offset = window.start;

        match category {
            Category::Hostname => {
                let Some(host) = &self.hostname else {
                    return Vec::new();
                };
                collect(&host.regex, line, haystack, offset, |m, before, after| {
                    validators::hostname_context_is_clean(before, after)
                        .then(|| host.canonical_for(m))
                })
            }
            Category::Ipv4 => collect(&IPV4_RE, line, haystack, offset, |m, before, after| {
                (validators::is_valid_ipv4_programmatically(m)
                    && validators::ipv4_context_is_clean(before, after))
                .then(|| m.to_string())
            }),
            Category::Ipv6 => collect_ipv6(line, haystack, offset),
            Category::Mac => collect(&MAC_RE, line, haystack, offset, |m, before, after| {
                (validators::is_valid_mac_programmatically(m)
                    && validators::token_context_is_clean(before, after))
                .then(|| m.to_string())
            }),
            Category::Keyword => {
                let Some(regex) = &self.keywords else {
                    return Vec::new();
                };
                collect(regex, line, haystack, offset, |m, _, _| Some(m.to_string()))
            }
        }
    }
}

fn collect<F>(regex: &Regex, line: &str, haystack: &str, offset: usize, accept: F) -> Vec<SpanMatch>
where
    F: Fn(&str, &str, &str) -> Option<String>,
{
    regex
        .find_iter(haystack)
        .filter_map(|m| {
            let start = offset + m.start();
            let end = offset + m.end();
            let original = accept(m.as_str(), &line[..start], &line[end..])?;
            Some(SpanMatch {
                range: start..end,
                original,
            })
        })
        .collect()
}

/// IPv6 candidates are greedy and may have swallowed a separator colon on
/// either side (`host:fe80::1`, `fe80::1: down`). A rejected candidate is
/// retried without a single leading and/or trailing `:`.
fn collect_ipv6(line: &str, haystack: &str, offset: usize) -> Vec<SpanMatch> {
    IPV6_CANDIDATE_RE
        .find_iter(haystack)
        .filter_map(|m| {
            let candidate = m.as_str();
            let lead = usize::from(candidate.starts_with(':') && !candidate.starts_with("::"));
            let trail = usize::from(candidate.ends_with(':') && !candidate.ends_with("::"));
            [(0, 0), (lead, 0), (0, trail), (lead, trail)]
                .into_iter()
                .map(|(l, t)| (offset + m.start() + l)..(offset + m.end() - t))
                .find(|range| {
                    range.start < range.end
                        && validators::is_valid_ipv6_programmatically(&line[range.clone()])
                        && validators::ipv6_context_is_clean(&line[..range.start], &line[range.end..])
                })
                .map(|range| SpanMatch {
                    original: line[range.clone()].to_string(),
                    range,
                })
        })
        .collect()
}
