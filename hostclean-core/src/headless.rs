// hostclean-core/src/headless.rs

//! `headless.rs`
//! Convenience wrapper for a full, one-shot cleaning run (non-interactive).
//! Builds a [`Cleaner`], walks the archive and writes the reports in a single
//! call.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::category::Category;
use crate::cleaner::{Cleaner, CleanerOptions, ReportOutcome};
use crate::config::{ObfuscationConfig, RedactionConfig};
use crate::stats::RunStats;

/// Everything a headless run produced.
#[derive(Debug, Clone)]
pub struct CleanSummary {
    pub run_id: String,
    pub stats: RunStats,
    /// Distinct originals mapped, per active category.
    pub mapped: BTreeMap<Category, usize>,
    pub outcome: ReportOutcome,
}

/// Cleans `archive_root` in place and writes reports named after
/// `archive_name`.
///
/// # Arguments
///
/// * `archive_root` - Directory holding the collected files.
/// * `archive_name` - Prefix of the CSV report file names.
/// * `obfuscation` - Which categories to pseudonymize.
/// * `redaction` - Drop patterns and keywords, already validated.
/// * `hostname` - The canonical FQDN of the host, if known.
/// * `options` - Report directory, facts path, run id and walk options.
pub fn headless_clean_archive(
    archive_root: &Path,
    archive_name: &str,
    obfuscation: ObfuscationConfig,
    redaction: RedactionConfig,
    hostname: Option<&str>,
    options: CleanerOptions,
) -> Result<CleanSummary> {
    let mut cleaner = Cleaner::new(obfuscation, redaction, hostname, options)
        .context("Failed to initialize the cleaner")?;
    cleaner
        .clean_archive(archive_root)
        .with_context(|| format!("Failed to clean archive {}", archive_root.display()))?;
    let outcome = cleaner
        .generate_report(archive_name)
        .context("Failed to write obfuscation reports")?;

    let mapped = cleaner
        .active_categories()
        .into_iter()
        .map(|c| cleaner.store().len(c).map(|n| (c, n)))
        .collect::<Result<BTreeMap<_, _>, _>>()
        .context("Failed to count mappings")?;

    Ok(CleanSummary {
        run_id: cleaner.run_id().to_string(),
        stats: cleaner.stats().clone(),
        mapped,
        outcome,
    })
}
