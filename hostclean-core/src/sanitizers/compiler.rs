//! compiler.rs - Compiles drop patterns into a matcher used once per run.
//!
//! Each pattern is compiled individually first so that every broken pattern
//! can be reported, then the whole list is folded into a single `RegexSet`
//! for line checks.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use regex::{RegexBuilder, RegexSet, RegexSetBuilder};

use crate::config::MAX_PATTERN_LENGTH;
use crate::errors::CleanerError;

const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// The compiled drop patterns of one run.
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    set: RegexSet,
    sources: Vec<String>,
}

impl Default for CompiledPatterns {
    fn default() -> Self {
        Self {
            set: RegexSet::empty(),
            sources: Vec::new(),
        }
    }
}

impl CompiledPatterns {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true when any pattern matches somewhere in `line`.
    pub fn is_match(&self, line: &str) -> bool {
        !self.sources.is_empty() && self.set.is_match(line)
    }

    /// The source text of the first pattern matching `line`, if any.
    pub fn first_match(&self, line: &str) -> Option<&str> {
        if self.sources.is_empty() {
            return None;
        }
        self.set
            .matches(line)
            .iter()
            .next()
            .map(|idx| self.sources[idx].as_str())
    }
}

/// Compiles the drop patterns.
///
/// A single failure is returned as its specific variant; several failures
/// are collected into one `Fatal` error listing all of them.
pub fn compile_patterns(patterns: &[String]) -> Result<CompiledPatterns, CleanerError> {
    debug!("Starting compilation of {} drop pattern(s).", patterns.len());

    let mut errors = Vec::new();
    for (idx, pattern) in patterns.iter().enumerate() {
        if pattern.is_empty() {
            errors.push(CleanerError::InvalidConfig(format!(
                "drop pattern #{} is empty and would match every line",
                idx
            )));
            continue;
        }
        if pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(CleanerError::PatternLengthExceeded(
                idx,
                pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
            continue;
        }
        if let Err(e) = RegexBuilder::new(pattern).size_limit(REGEX_SIZE_LIMIT).build() {
            errors.push(CleanerError::PatternCompilation(pattern.clone(), e));
        }
    }

    if errors.len() == 1 {
        return Err(errors.remove(0));
    }
    if !errors.is_empty() {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(CleanerError::Fatal(format!(
            "Failed to compile {} drop pattern(s):\n{}",
            errors.len(),
            message
        )));
    }

    let set = RegexSetBuilder::new(patterns)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| CleanerError::Fatal(format!("Failed to build drop pattern set: {}", e)))?;

    debug!("Finished compiling drop patterns. Total compiled: {}.", patterns.len());
    Ok(CompiledPatterns {
        set,
        sources: patterns.to_vec(),
    })
}
