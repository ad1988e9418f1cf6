//! The `Cleaner` facade: one instance per collection run.
//!
//! It owns the run's [`MappingStore`], so every file cleaned through the
//! same `Cleaner` shares one consistent set of substitutions, and it writes
//! the reports and facts once the walk is over.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::category::Category;
use crate::config::{ObfuscationConfig, RedactionConfig};
use crate::errors::CleanerError;
use crate::facts::{build_facts, write_facts, DEFAULT_FACTS_PATH};
use crate::file_cleaner::FileCleaner;
use crate::line::{LineOutcome, LineProcessor};
use crate::mapping::{compute_run_seed, MappingStore};
use crate::matcher::PatternMatcher;
use crate::report::ReportGenerator;
use crate::stats::{merge_counts, FileStats, RunStats};
use crate::walker::{ArchiveWalker, WalkOptions};

/// Run-level options that are not part of the redaction configuration.
#[derive(Debug, Clone)]
pub struct CleanerOptions {
    /// Directory receiving the CSV reports.
    pub report_dir: PathBuf,
    /// Where the facts document goes. `None` disables it.
    pub facts_path: Option<PathBuf>,
    /// Pins the run id (and with it the IPv6 output). A fresh UUID v4 is
    /// used when unset.
    pub run_id: Option<String>,
    pub walk: WalkOptions,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self {
            report_dir: std::env::temp_dir(),
            facts_path: Some(PathBuf::from(DEFAULT_FACTS_PATH)),
            run_id: None,
            walk: WalkOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerState {
    Created,
    Walking,
    Reported,
}

/// What `generate_report` wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOutcome {
    pub reports: Vec<PathBuf>,
    pub facts: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Cleaner {
    obfuscation: ObfuscationConfig,
    redaction: RedactionConfig,
    hostname: Option<String>,
    options: CleanerOptions,
    run_id: String,
    store: MappingStore,
    matcher: PatternMatcher,
    state: CleanerState,
    stats: RunStats,
}

impl Cleaner {
    /// Builds the run state. When hostname obfuscation is on, the canonical
    /// hostname is registered right away so reports and facts always list it.
    pub fn new(
        obfuscation: ObfuscationConfig,
        redaction: RedactionConfig,
        hostname: Option<&str>,
        options: CleanerOptions,
    ) -> Result<Self, CleanerError> {
        let hostname = hostname
            .map(|h| h.trim().trim_end_matches('.').to_string())
            .filter(|h| !h.is_empty());
        let run_id = options
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let run_seed = compute_run_seed(&run_id)?;

        let store = MappingStore::new(&run_seed, hostname.as_deref());
        let matcher = PatternMatcher::new(
            hostname.as_deref(),
            redaction.keywords(),
            redaction.compiled_patterns(),
        )?;

        if obfuscation.obfuscate_hostname {
            match hostname.as_deref() {
                Some(h) => {
                    store.get_or_create(Category::Hostname, h)?;
                }
                None => warn!("Hostname obfuscation is enabled but no hostname is known."),
            }
        }

        info!(
            "Cleaner created (run {}): obfuscation_list={}, {} keyword(s), {} drop pattern(s)",
            run_id,
            obfuscation.obfuscation_list().join(","),
            redaction.keywords().len(),
            redaction.patterns().len()
        );

        Ok(Self {
            obfuscation,
            redaction,
            hostname,
            options,
            run_id,
            store,
            matcher,
            state: CleanerState::Created,
            stats: RunStats::default(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> CleanerState {
        self.state
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    fn keywords_enabled(&self) -> bool {
        !self.redaction.keywords().is_empty()
    }

    /// Categories whose mappings are reported.
    pub fn active_categories(&self) -> Vec<Category> {
        Category::PRIORITY
            .into_iter()
            .filter(|c| match c {
                Category::Keyword => self.keywords_enabled(),
                other => self.obfuscation.is_enabled(*other),
            })
            .collect()
    }

    fn begin_walk(&mut self, operation: &'static str) -> Result<(), CleanerError> {
        if self.state == CleanerState::Reported {
            return Err(CleanerError::InvalidState(operation));
        }
        self.state = CleanerState::Walking;
        Ok(())
    }

    /// Cleans a single file in place. `no_obfuscate` suppresses categories
    /// for this file only.
    pub fn clean_file(&mut self, path: &Path, no_obfuscate: &[Category]) -> Result<FileStats, CleanerError> {
        self.begin_walk("clean files")?;
        let result = {
            let processor = LineProcessor::new(
                &self.matcher,
                &self.store,
                &self.obfuscation,
                self.keywords_enabled(),
            );
            FileCleaner::new(processor).clean(path, no_obfuscate)
        };
        match &result {
            Ok(file_stats) => self.stats.record_file(file_stats),
            Err(e) => {
                warn!("Failed to clean {}: {}", path.display(), e);
                self.stats.record_failed(path, e.to_string());
            }
        }
        result
    }

    /// Cleans every file under `root`. Returns the stats of this walk; the
    /// run totals keep accumulating in [`Cleaner::stats`].
    pub fn clean_archive(&mut self, root: &Path) -> Result<RunStats, CleanerError> {
        self.begin_walk("clean an archive")?;
        let walk_stats = {
            let processor = LineProcessor::new(
                &self.matcher,
                &self.store,
                &self.obfuscation,
                self.keywords_enabled(),
            );
            let cleaner = FileCleaner::new(processor);
            ArchiveWalker::new(root, &self.options.walk).walk(&cleaner)?
        };
        walk_stats.log_summary();
        self.stats.merge(walk_stats.clone());
        Ok(walk_stats)
    }

    /// Cleans an in-memory string, such as facts about to be uploaded, with
    /// the same mappings and drop patterns as the archive files. Lines that
    /// match a drop pattern are removed; terminators are kept.
    pub fn clean_content(&mut self, text: &str) -> Result<String, CleanerError> {
        self.begin_walk("clean content")?;
        let processor = LineProcessor::new(
            &self.matcher,
            &self.store,
            &self.obfuscation,
            self.keywords_enabled(),
        );
        let mut content = FileStats::default();
        let mut out = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            content.lines_read += 1;
            match processor.process(line, &[])? {
                LineOutcome::Dropped { .. } => content.lines_dropped += 1,
                LineOutcome::Kept {
                    text,
                    substitutions,
                } => {
                    out.push_str(&text);
                    merge_counts(&mut content.substitutions, &substitutions);
                }
            }
        }
        self.stats.lines_read += content.lines_read;
        self.stats.lines_dropped += content.lines_dropped;
        merge_counts(&mut self.stats.substitutions, &content.substitutions);
        Ok(out)
    }

    /// Writes the CSV reports and the facts document. May be called again;
    /// the mapping state no longer changes, so the output is the same.
    pub fn generate_report(&mut self, archive_name: &str) -> Result<ReportOutcome, CleanerError> {
        if self.state == CleanerState::Reported {
            debug!("Reports already generated for run {}, rewriting", self.run_id);
        }

        let active = self.active_categories();
        let reports = ReportGenerator::new(&self.options.report_dir, archive_name)
            .write_reports(&self.store, &active)?;

        let facts = match &self.options.facts_path {
            Some(path) => {
                let document = build_facts(
                    self.hostname.as_deref(),
                    &self.obfuscation,
                    self.keywords_enabled(),
                    &self.store,
                )?;
                Some(write_facts(path, &document)?)
            }
            None => None,
        };

        self.state = CleanerState::Reported;
        Ok(ReportOutcome { reports, facts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn options(dir: &TempDir) -> CleanerOptions {
        CleanerOptions {
            report_dir: dir.path().join("reports"),
            facts_path: Some(dir.path().join("facts.json")),
            run_id: Some("cleaner-tests".to_string()),
            walk: WalkOptions::default(),
        }
    }

    #[test]
    fn test_hostname_registered_at_construction() {
        let dir = tempdir().unwrap();
        let cleaner = Cleaner::new(
            ObfuscationConfig::new(false, false, true),
            RedactionConfig::default(),
            Some("report.test.com"),
            options(&dir),
        )
        .unwrap();
        let entries = cleaner.store().export(Category::Hostname).unwrap();
        assert_eq!(entries[0].obfuscated, "f9fe0db0c046.example.com");
        assert_eq!(cleaner.state(), CleanerState::Created);
    }

    #[test]
    fn test_state_machine() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "10.0.0.1\n").unwrap();

        let mut cleaner = Cleaner::new(
            ObfuscationConfig::new(true, false, false),
            RedactionConfig::default(),
            None,
            options(&dir),
        )
        .unwrap();
        cleaner.clean_file(&file, &[]).unwrap();
        assert_eq!(cleaner.state(), CleanerState::Walking);

        let first = cleaner.generate_report("archive").unwrap();
        let second = cleaner.generate_report("archive").unwrap();
        assert_eq!(first, second);
        assert_eq!(cleaner.state(), CleanerState::Reported);

        assert!(matches!(
            cleaner.clean_file(&file, &[]),
            Err(CleanerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_report_from_created_state() {
        let dir = tempdir().unwrap();
        let mut cleaner = Cleaner::new(
            ObfuscationConfig::default(),
            RedactionConfig::default(),
            None,
            options(&dir),
        )
        .unwrap();
        let outcome = cleaner.generate_report("empty").unwrap();
        assert!(outcome.reports.is_empty());
        assert!(outcome.facts.is_some());
    }

    #[test]
    fn test_clean_content_shares_run_mappings() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "peer 10.0.9.9\n").unwrap();

        let mut cleaner = Cleaner::new(
            ObfuscationConfig::new(true, false, false),
            RedactionConfig::new(vec!["password"], vec!["acme"]).unwrap(),
            None,
            options(&dir),
        )
        .unwrap();
        let cleaned = cleaner
            .clean_content("{\"ip\": \"10.0.2.155\", \"org\": \"acme\"}\npassword=1\n")
            .unwrap();
        assert_eq!(cleaned, "{\"ip\": \"10.230.230.1\", \"org\": \"keyword0\"}\n");
        assert_eq!(cleaner.state(), CleanerState::Walking);
        assert_eq!(cleaner.stats().lines_dropped, 1);

        cleaner.clean_file(&file, &[]).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "peer 10.230.230.2\n");
        assert_eq!(cleaner.clean_content("again 10.0.2.155").unwrap(), "again 10.230.230.1");

        cleaner.generate_report("archive").unwrap();
        assert!(matches!(
            cleaner.clean_content("10.0.2.155"),
            Err(CleanerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_failed_file_recorded() {
        let dir = tempdir().unwrap();
        let mut cleaner = Cleaner::new(
            ObfuscationConfig::default(),
            RedactionConfig::default(),
            None,
            options(&dir),
        )
        .unwrap();
        assert!(cleaner.clean_file(&dir.path().join("missing"), &[]).is_err());
        assert_eq!(cleaner.stats().failed.len(), 1);
    }
}
