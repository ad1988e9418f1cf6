//! errors.rs - Custom error types for the hostclean-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that callers can handle programmatically.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;
use thiserror::Error;

use crate::category::Category;

/// All possible error types in the `hostclean-core` library.
///
/// `#[non_exhaustive]` lets new variants be added without breaking callers
/// that match on this enum.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CleanerError {
    #[error("Failed to compile redaction pattern '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("Redaction pattern #{0}: length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(usize, usize, usize),

    #[error("Invalid redaction configuration: {0}")]
    InvalidConfig(String),

    #[error("No free obfuscated value left for {0} original '{1}'")]
    AllocationExhausted(Category, String),

    #[error("Cleaner cannot {0} once reports have been generated")]
    InvalidState(&'static str),

    #[error("Failed to write report '{path}': {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write facts document '{path}': {source}")]
    Facts {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mapping registry for {0} is poisoned")]
    LockPoisoned(Category),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}

pub type Result<T, E = CleanerError> = std::result::Result<T, E>;
