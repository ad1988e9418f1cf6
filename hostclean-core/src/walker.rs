//! Recursive archive traversal.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::category::Category;
use crate::errors::CleanerError;
use crate::file_cleaner::FileCleaner;
use crate::stats::{FileStats, RunStats};

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Paths to leave alone. Relative entries are resolved against the
    /// archive root; a directory excludes everything below it.
    pub skip_paths: Vec<PathBuf>,
    /// File extensions to leave alone, without the leading dot.
    pub skip_extensions: Vec<String>,
    /// Categories to suppress for specific files, keyed by path relative to
    /// the archive root.
    pub no_obfuscate: BTreeMap<PathBuf, Vec<Category>>,
    /// Worker threads. 0 and 1 both mean sequential.
    pub jobs: usize,
}

#[derive(Debug)]
pub struct ArchiveWalker<'o> {
    root: PathBuf,
    options: &'o WalkOptions,
}

impl<'o> ArchiveWalker<'o> {
    pub fn new(root: impl Into<PathBuf>, options: &'o WalkOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let rel = self.relative(path);
        let by_path = self.options.skip_paths.iter().any(|skip| {
            if skip.is_absolute() {
                path.starts_with(skip)
            } else {
                rel.starts_with(skip)
            }
        });
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| {
                self.options
                    .skip_extensions
                    .iter()
                    .any(|s| s.trim_start_matches('.').eq_ignore_ascii_case(ext))
            });
        by_path || by_extension
    }

    /// Regular files to clean, in lexicographic order. Everything else is
    /// recorded as skipped.
    fn collect_files(&self, stats: &mut RunStats) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    warn!("Skipping {}: {}", path.display(), e);
                    stats.record_skipped(path, e.to_string());
                    continue;
                }
            };
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            let path = entry.path();
            if file_type.is_symlink() {
                debug!("Skipping symbolic link {}", path.display());
                stats.record_skipped(path, "symbolic link");
            } else if !file_type.is_file() {
                debug!("Skipping special file {}", path.display());
                stats.record_skipped(path, "not a regular file");
            } else if self.is_excluded(path) {
                debug!("Skipping excluded file {}", path.display());
                stats.record_skipped(path, "excluded");
            } else {
                files.push(path.to_path_buf());
            }
        }
        files
    }

    fn clean_one(&self, cleaner: &FileCleaner<'_>, path: &Path) -> Result<FileStats, CleanerError> {
        let no_obfuscate = self
            .options
            .no_obfuscate
            .get(self.relative(path))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        cleaner.clean(path, no_obfuscate)
    }

    fn record(stats: &mut RunStats, path: &Path, result: Result<FileStats, CleanerError>) {
        match result {
            Ok(file_stats) => stats.record_file(&file_stats),
            Err(e) => {
                warn!("Failed to clean {}: {}", path.display(), e);
                stats.record_failed(path, e.to_string());
            }
        }
    }

    /// Cleans every file under the root. Per-file failures are recorded and
    /// never stop the walk; only a missing root or an unusable thread pool
    /// is an error.
    pub fn walk(&self, cleaner: &FileCleaner<'_>) -> Result<RunStats, CleanerError> {
        let meta = std::fs::metadata(&self.root)?;
        if !meta.is_dir() {
            return Err(CleanerError::InvalidConfig(format!(
                "archive root {} is not a directory",
                self.root.display()
            )));
        }

        let mut stats = RunStats::default();
        let files = self.collect_files(&mut stats);
        info!(
            "Cleaning {} file(s) under {} ({} skipped)",
            files.len(),
            self.root.display(),
            stats.skipped.len()
        );

        if self.options.jobs <= 1 {
            for path in &files {
                let result = self.clean_one(cleaner, path);
                Self::record(&mut stats, path, result);
            }
            return Ok(stats);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .thread_name(|idx| format!("hostclean-worker-{}", idx))
            .build()
            .map_err(|e| CleanerError::Fatal(format!("Failed to build worker pool: {}", e)))?;
        let results: Vec<Result<FileStats, CleanerError>> =
            pool.install(|| files.par_iter().map(|p| self.clean_one(cleaner, p)).collect());
        for (path, result) in files.iter().zip(results) {
            Self::record(&mut stats, path, result);
        }
        Ok(stats)
    }
}
