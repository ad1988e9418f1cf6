// hostclean-core/src/lib.rs
//! # Hostclean Core Library
//!
//! `hostclean-core` pseudonymizes sensitive values across a directory of
//! collected diagnostic files and drops lines matching redaction patterns.
//! Substitutions are consistent for the whole run: the same address or
//! keyword gets the same stand-in in every file, and every substitution is
//! reported afterwards.
//!
//! ## Modules
//!
//! * `category`: The closed set of obfuscation categories and their names.
//! * `config`: `ObfuscationConfig` toggles and the validated `RedactionConfig`.
//! * `mapping`: The run-scoped `MappingStore` and per-category allocators.
//! * `matcher`: Locates category spans and drop-pattern hits in a line.
//! * `validators`: Programmatic checks applied on top of the regex hits.
//! * `sanitizers`: Drop-pattern compilation.
//! * `line`: Cleans one line.
//! * `file_cleaner`: Streams one file and replaces it atomically.
//! * `walker`: Recursive archive traversal, sequential or on a rayon pool.
//! * `report` / `facts`: CSV audit reports and the facts document.
//! * `cleaner`: The `Cleaner` facade tying a run together.
//! * `headless`: One-call convenience wrapper.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use hostclean_core::{headless_clean_archive, CleanerOptions, ObfuscationConfig, RedactionConfig};
//! use std::path::Path;
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let redaction = RedactionConfig::new(vec!["^password"], vec!["projectx"])?;
//!     let obfuscation = ObfuscationConfig::new(true, true, true);
//!
//!     let summary = headless_clean_archive(
//!         Path::new("/var/tmp/collection/archive"),
//!         "archive",
//!         obfuscation,
//!         redaction,
//!         Some("host01.example.org"),
//!         CleanerOptions::default(),
//!     )?;
//!     println!("cleaned {} file(s)", summary.stats.files_cleaned);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`CleanerError`]. Loading configuration files
//! and the headless wrapper use `anyhow` for context-rich errors.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod category;
pub mod cleaner;
pub mod config;
pub mod errors;
pub mod facts;
pub mod file_cleaner;
pub mod headless;
pub mod line;
pub mod mapping;
pub mod matcher;
pub mod redaction_match;
pub mod report;
pub mod sanitizers;
pub mod stats;
pub mod validators;
pub mod walker;

/// Re-exports the category enum.
pub use category::Category;

/// Re-exports the run configuration types.
pub use config::{
    verify_permissions, ContentRedactionFile, ObfuscationConfig, RedactionConfig,
    MAX_PATTERN_LENGTH,
};

/// Re-exports the custom error type for clear error reporting.
pub use errors::CleanerError;

/// Re-exports the facade and its options.
pub use cleaner::{Cleaner, CleanerOptions, CleanerState, ReportOutcome};

/// Re-exports mapping state types.
pub use mapping::{compute_run_seed, MappingEntry, MappingStore};

/// Re-exports statistics types.
pub use stats::{FileIssue, FileStats, RunStats};

pub use facts::DEFAULT_FACTS_PATH;
pub use walker::WalkOptions;

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{headless_clean_archive, CleanSummary};

pub use redaction_match::redact_sensitive;
