//! Configuration management for `hostclean-core`.
//!
//! This module defines the two run-scoped configuration objects the cleaner
//! consumes:
//!
//! * [`ObfuscationConfig`]: which value categories get pseudonymized.
//! * [`RedactionConfig`]: the content part of the redaction configuration,
//!   i.e. drop `patterns` (regexes) and literal `keywords`.
//!
//! A `RedactionConfig` can only be obtained in validated form: every pattern
//! is compiled at construction, and a broken pattern aborts construction
//! instead of being silently ignored.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::category::Category;
use crate::errors::CleanerError;
use crate::sanitizers::compiler::{compile_patterns, CompiledPatterns};

/// Maximum allowed length for a drop-pattern regex string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Categories that may appear in an `obfuscation_list` string.
pub const DEFAULT_OBFUSCATIONS: [Category; 4] =
    [Category::Hostname, Category::Ipv4, Category::Ipv6, Category::Mac];

/// Per-run toggles for the format-based obfuscation categories.
///
/// Keyword substitution is not toggled here; it is active whenever the
/// [`RedactionConfig`] carries at least one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObfuscationConfig {
    /// Obfuscate IPv4 addresses (the legacy `obfuscate` option).
    #[serde(alias = "obfuscate")]
    pub obfuscate_ipv4: bool,
    pub obfuscate_ipv6: bool,
    pub obfuscate_hostname: bool,
    pub obfuscate_mac: bool,
}

impl ObfuscationConfig {
    pub fn new(obfuscate_ipv4: bool, obfuscate_ipv6: bool, obfuscate_hostname: bool) -> Self {
        Self {
            obfuscate_ipv4,
            obfuscate_ipv6,
            obfuscate_hostname,
            obfuscate_mac: false,
        }
    }

    pub fn with_mac(mut self, enabled: bool) -> Self {
        self.obfuscate_mac = enabled;
        self
    }

    /// Builds the toggles from a comma-separated list such as `"ipv4,hostname"`.
    ///
    /// Surrounding quotes are stripped. Unknown entries are ignored with a
    /// warning naming the list that was actually applied.
    pub fn from_obfuscation_list(list: &str) -> Self {
        let requested: HashSet<String> = list
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .split(',')
            .map(|opt| opt.trim().to_ascii_lowercase())
            .filter(|opt| !opt.is_empty())
            .collect();

        let mut config = Self::default();
        let mut invalid: Vec<&str> = Vec::new();
        for opt in &requested {
            match opt.parse::<Category>() {
                Ok(category) if DEFAULT_OBFUSCATIONS.contains(&category) => {
                    config.set_enabled(category, true);
                }
                _ => invalid.push(opt.as_str()),
            }
        }

        if !invalid.is_empty() {
            invalid.sort_unstable();
            warn!(
                "Ignoring invalid obfuscate options: `{}`, using: \"obfuscation_list={}\".",
                invalid.join("`, `"),
                config.obfuscation_list().join(",")
            );
        }
        config
    }

    /// The enabled categories as a sorted `obfuscation_list`.
    pub fn obfuscation_list(&self) -> Vec<&'static str> {
        let mut list: Vec<&'static str> = DEFAULT_OBFUSCATIONS
            .iter()
            .filter(|c| self.is_enabled(**c))
            .map(|c| c.facts_slug())
            .collect();
        list.sort_unstable();
        list
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Hostname => self.obfuscate_hostname,
            Category::Ipv4 => self.obfuscate_ipv4,
            Category::Ipv6 => self.obfuscate_ipv6,
            Category::Mac => self.obfuscate_mac,
            Category::Keyword => false,
        }
    }

    fn set_enabled(&mut self, category: Category, enabled: bool) {
        match category {
            Category::Hostname => self.obfuscate_hostname = enabled,
            Category::Ipv4 => self.obfuscate_ipv4 = enabled,
            Category::Ipv6 => self.obfuscate_ipv6 = enabled,
            Category::Mac => self.obfuscate_mac = enabled,
            Category::Keyword => {}
        }
    }
}

/// The object form of the `patterns` section: `{ regex: [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegexSection {
    pub regex: Vec<String>,
}

/// The `patterns` section. A plain list holds fixed strings matched
/// literally; only the `{regex: [...]}` object holds regular expressions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PatternSection {
    List(Vec<String>),
    Regex(RegexSection),
}

impl PatternSection {
    /// Regex sources for the drop-pattern compiler.
    fn into_patterns(self) -> Vec<String> {
        match self {
            PatternSection::List(list) => list.iter().map(|p| regex::escape(p)).collect(),
            PatternSection::Regex(section) => section.regex,
        }
    }
}

/// On-disk shape of a content redaction file. Unknown sections are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentRedactionFile {
    pub patterns: Option<PatternSection>,
    pub keywords: Option<Vec<String>>,
}

/// Validated content redaction settings: drop patterns and keywords.
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    patterns: Vec<String>,
    keywords: Vec<String>,
    compiled: Arc<CompiledPatterns>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            keywords: Vec::new(),
            compiled: Arc::new(CompiledPatterns::default()),
        }
    }
}

impl RedactionConfig {
    /// Builds and validates a configuration, compiling every pattern.
    ///
    /// Keywords keep their first-occurrence order; duplicates and blank
    /// entries are dropped.
    pub fn new<P, K>(patterns: P, keywords: K) -> Result<Self, CleanerError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = compile_patterns(&patterns)?;

        let mut seen = HashSet::new();
        let mut normalized = Vec::new();
        for keyword in keywords.into_iter().map(Into::into) {
            if keyword.trim().is_empty() {
                warn!("Ignoring blank keyword in redaction configuration.");
                continue;
            }
            if seen.insert(keyword.clone()) {
                normalized.push(keyword);
            } else {
                debug!("Duplicate keyword ignored.");
            }
        }

        Ok(Self {
            patterns,
            keywords: normalized,
            compiled: Arc::new(compiled),
        })
    }

    pub fn from_file_contents(contents: ContentRedactionFile) -> Result<Self, CleanerError> {
        let patterns = contents
            .patterns
            .map(PatternSection::into_patterns)
            .unwrap_or_default();
        Self::new(patterns, contents.keywords.unwrap_or_default())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let contents: ContentRedactionFile =
            serde_yml::from_str(text).context("Failed to parse content redaction YAML")?;
        Ok(Self::from_file_contents(contents)?)
    }

    /// Loads a content redaction YAML file.
    ///
    /// The file is expected to be mode `0600`. A different mode is a warning,
    /// or an error when `strict_permissions` is set.
    pub fn load_from_file<P: AsRef<Path>>(path: P, strict_permissions: bool) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading content redaction rules from: {}", path.display());

        if let Err(e) = verify_permissions(path) {
            if strict_permissions {
                return Err(e);
            }
            warn!("{}", e);
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read redaction file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to load redaction file {}", path.display()))?;

        info!(
            "Loaded {} pattern(s) and {} keyword(s) from {}.",
            config.patterns.len(),
            config.keywords.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// The drop patterns, compiled once and shared with the matcher.
    pub fn compiled_patterns(&self) -> Arc<CompiledPatterns> {
        Arc::clone(&self.compiled)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.keywords.is_empty()
    }
}

/// Checks that a redaction file is readable by its owner only (`0600`).
#[cfg(unix)]
pub fn verify_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions()
        .mode()
        & 0o7777;
    if mode != 0o600 {
        anyhow::bail!(
            "Invalid permissions on {}. Expected 0600 got {:o}",
            path.display(),
            mode
        );
    }
    debug!("Correct file permissions on {}", path.display());
    Ok(())
}

#[cfg(not(unix))]
pub fn verify_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
