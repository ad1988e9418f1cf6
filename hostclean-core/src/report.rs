//! Per-category CSV audit reports.
//!
//! One file per category, `<report_dir>/<archive_name>-<slug>.csv`, with a
//! two column header and one `obfuscated,original` row per mapping in
//! first-seen order.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::category::Category;
use crate::errors::CleanerError;
use crate::mapping::{MappingEntry, MappingStore};

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Renders the report body for one category.
pub fn render_csv(category: Category, entries: &[MappingEntry]) -> String {
    let [obfuscated, original] = category.report_header();
    let mut csv = format!("{},{}\n", escape_csv(&obfuscated), escape_csv(&original));
    for entry in entries {
        csv.push_str(&escape_csv(&entry.obfuscated));
        csv.push(',');
        csv.push_str(&escape_csv(&entry.original));
        csv.push('\n');
    }
    csv
}

pub fn report_path(report_dir: &Path, archive_name: &str, category: Category) -> PathBuf {
    report_dir.join(format!("{}-{}.csv", archive_name, category.report_slug()))
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    report_dir: PathBuf,
    archive_name: String,
}

impl ReportGenerator {
    pub fn new(report_dir: impl Into<PathBuf>, archive_name: impl Into<String>) -> Self {
        Self {
            report_dir: report_dir.into(),
            archive_name: archive_name.into(),
        }
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.report_dir)?;
        let mut tmp = NamedTempFile::new_in(&self.report_dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Writes one report per active category that has mappings and removes
    /// any stale report for the others. Returns the paths written.
    pub fn write_reports(
        &self,
        store: &MappingStore,
        active: &[Category],
    ) -> Result<Vec<PathBuf>, CleanerError> {
        let mut written = Vec::new();
        for category in Category::PRIORITY {
            let path = report_path(&self.report_dir, &self.archive_name, category);
            let entries = if active.contains(&category) {
                store.export(category)?
            } else {
                Vec::new()
            };

            if entries.is_empty() {
                match fs::remove_file(&path) {
                    Ok(()) => debug!("Removed stale report {}", path.display()),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => return Err(CleanerError::Report { path, source }),
                }
                continue;
            }

            self.write_atomic(&path, &render_csv(category, &entries))
                .map_err(|source| CleanerError::Report {
                    path: path.clone(),
                    source,
                })?;
            info!("Wrote {} {} mapping(s) to {}", entries.len(), category.label(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}
