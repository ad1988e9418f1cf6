//! Per-file and per-run counters.
//!
//! License: MIT OR APACHE 2.0

use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::category::Category;

/// Substitutions made per category.
pub type CategoryCounts = BTreeMap<Category, u64>;

pub(crate) fn merge_counts(into: &mut CategoryCounts, from: &CategoryCounts) {
    for (category, n) in from {
        *into.entry(*category).or_insert(0) += n;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub lines_read: u64,
    pub lines_dropped: u64,
    pub substitutions: CategoryCounts,
}

impl FileStats {
    pub fn total_substitutions(&self) -> u64 {
        self.substitutions.values().sum()
    }

    /// True when cleaning changed nothing in the file.
    pub fn is_untouched(&self) -> bool {
        self.lines_dropped == 0 && self.total_substitutions() == 0
    }
}

/// A file the walker did not clean, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files_cleaned: u64,
    pub lines_read: u64,
    pub lines_dropped: u64,
    pub substitutions: CategoryCounts,
    pub skipped: Vec<FileIssue>,
    pub failed: Vec<FileIssue>,
}

impl RunStats {
    pub fn record_file(&mut self, stats: &FileStats) {
        self.files_cleaned += 1;
        self.lines_read += stats.lines_read;
        self.lines_dropped += stats.lines_dropped;
        merge_counts(&mut self.substitutions, &stats.substitutions);
    }

    pub fn record_skipped(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.skipped.push(FileIssue {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub fn record_failed(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.failed.push(FileIssue {
            path: path.into(),
            reason: reason.into(),
        });
    }

    /// Folds the stats of another (partial) walk into this one.
    pub fn merge(&mut self, other: RunStats) {
        self.files_cleaned += other.files_cleaned;
        self.lines_read += other.lines_read;
        self.lines_dropped += other.lines_dropped;
        merge_counts(&mut self.substitutions, &other.substitutions);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }

    pub fn substitutions_for(&self, category: Category) -> u64 {
        self.substitutions.get(&category).copied().unwrap_or(0)
    }

    pub fn log_summary(&self) {
        info!(
            "Cleaned {} file(s): {} line(s) read, {} dropped, {} skipped, {} failed",
            self.files_cleaned,
            self.lines_read,
            self.lines_dropped,
            self.skipped.len(),
            self.failed.len()
        );
        for (category, n) in &self.substitutions {
            info!("  {} substitutions: {}", category, n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut file = FileStats {
            lines_read: 3,
            lines_dropped: 1,
            ..Default::default()
        };
        file.substitutions.insert(Category::Ipv4, 2);

        let mut run = RunStats::default();
        run.record_file(&file);
        run.record_skipped("/a/link", "symlink");

        let mut other = RunStats::default();
        other.record_file(&file);
        other.record_failed("/a/b", "permission denied");
        run.merge(other);

        assert_eq!(run.files_cleaned, 2);
        assert_eq!(run.lines_read, 6);
        assert_eq!(run.substitutions_for(Category::Ipv4), 4);
        assert_eq!(run.substitutions_for(Category::Mac), 0);
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.failed[0].reason, "permission denied");
    }

    #[test]
    fn test_untouched_file() {
        assert!(FileStats::default().is_untouched());
    }
}
