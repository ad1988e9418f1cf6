// hostclean/src/commands/clean.rs
//! `hostclean clean`: cleans an archive in place and prints a summary.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use hostclean_core::{
    headless_clean_archive, Category, CleanSummary, CleanerOptions, ObfuscationConfig,
    RedactionConfig, WalkOptions, DEFAULT_FACTS_PATH,
};

use crate::cli::CleanCommand;

const KERNEL_HOSTNAME_PATH: &str = "/proc/sys/kernel/hostname";

/// The explicit hostname, else the kernel's, else none.
pub fn resolve_hostname(explicit: Option<&str>) -> Option<String> {
    if let Some(h) = explicit.map(str::trim).filter(|h| !h.is_empty()) {
        return Some(h.to_string());
    }
    match std::fs::read_to_string(KERNEL_HOSTNAME_PATH) {
        Ok(h) if !h.trim().is_empty() => Some(h.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            debug!("Could not read {}: {}", KERNEL_HOSTNAME_PATH, e);
            None
        }
    }
}

pub fn obfuscation_from_args(cmd: &CleanCommand) -> ObfuscationConfig {
    match &cmd.obfuscation_list {
        Some(list) => ObfuscationConfig::from_obfuscation_list(list),
        None => ObfuscationConfig::new(cmd.obfuscate, cmd.obfuscate_ipv6, cmd.obfuscate_hostname)
            .with_mac(cmd.obfuscate_mac),
    }
}

fn archive_name(archive: &Path, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| {
            archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "archive".to_string())
}

fn options_from_args(cmd: &CleanCommand) -> CleanerOptions {
    let facts_path = if cmd.no_facts {
        None
    } else {
        Some(
            cmd.facts_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FACTS_PATH)),
        )
    };
    CleanerOptions {
        report_dir: cmd.report_dir.clone().unwrap_or_else(std::env::temp_dir),
        facts_path,
        run_id: cmd.run_id.clone(),
        walk: WalkOptions {
            skip_paths: cmd.skip.clone(),
            skip_extensions: cmd.skip_ext.clone(),
            jobs: cmd.jobs,
            ..Default::default()
        },
    }
}

/// Runs the `clean` command and prints the summary to `out`.
pub fn run_clean<W: Write>(cmd: &CleanCommand, out: &mut W) -> Result<CleanSummary> {
    let redaction = match &cmd.redaction_file {
        Some(path) => RedactionConfig::load_from_file(path, cmd.strict_permissions)?,
        None => RedactionConfig::default(),
    };
    let obfuscation = obfuscation_from_args(cmd);
    let hostname = resolve_hostname(cmd.hostname.as_deref());
    let name = archive_name(&cmd.archive, cmd.archive_name.as_deref());

    info!("Cleaning archive {} as '{}'", cmd.archive.display(), name);
    let summary = headless_clean_archive(
        &cmd.archive,
        &name,
        obfuscation,
        redaction,
        hostname.as_deref(),
        options_from_args(cmd),
    )?;

    for skipped in &summary.stats.skipped {
        warn!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }

    if !cmd.no_summary {
        if cmd.json {
            let json = serde_json::json!({
                "run_id": summary.run_id,
                "stats": summary.stats,
                "mapped": summary.mapped,
                "reports": summary.outcome.reports,
                "facts": summary.outcome.facts,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)
                .context("Failed to write summary")?;
        } else {
            writeln!(out, "{}", summary_table(&summary)).context("Failed to write summary")?;
        }
    }
    Ok(summary)
}

fn summary_table(summary: &CleanSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Category", "Unique values", "Substitutions"]);

    for category in Category::PRIORITY {
        let Some(mapped) = summary.mapped.get(&category) else {
            continue;
        };
        table.add_row(vec![
            Cell::new(category.label()),
            Cell::new(mapped),
            Cell::new(summary.stats.substitutions_for(category)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Files cleaned"),
        Cell::new(summary.stats.files_cleaned),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Lines dropped"),
        Cell::new(summary.stats.lines_dropped),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Files skipped / failed"),
        Cell::new(format!("{} / {}", summary.stats.skipped.len(), summary.stats.failed.len())),
        Cell::new(""),
    ]);
    table
}
