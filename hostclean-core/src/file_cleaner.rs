//! Streams a single file through the [`LineProcessor`] and replaces it
//! atomically.
//!
//! Output goes to a temporary file created next to the original and is
//! renamed over it only after the last line was written. If anything fails
//! once the file was found, the temporary file is dropped and the original is
//! truncated (or removed when it cannot be truncated), so a half-cleaned file
//! never leaves unsanitized content in the archive.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, error, trace, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::category::Category;
use crate::errors::CleanerError;
use crate::line::{LineOutcome, LineProcessor};
use crate::redaction_match::log_dropped_line_debug;
use crate::stats::{merge_counts, FileStats};

#[derive(Debug, Clone, Copy)]
pub struct FileCleaner<'a> {
    processor: LineProcessor<'a>,
}

impl<'a> FileCleaner<'a> {
    pub fn new(processor: LineProcessor<'a>) -> Self {
        Self { processor }
    }

    /// Cleans `path` in place.
    ///
    /// Lines are read as raw bytes and decoded lossily, so the file is never
    /// loaded whole and invalid UTF-8 never aborts the run. A file in which
    /// nothing was dropped or substituted is left byte-for-byte as it was.
    pub fn clean(&self, path: &Path, no_obfuscate: &[Category]) -> Result<FileStats, CleanerError> {
        let metadata = fs::metadata(path)?;
        if metadata.len() == 0 {
            trace!("{}: empty, nothing to clean", path.display());
            return Ok(FileStats::default());
        }

        match self.rewrite(path, &metadata, no_obfuscate) {
            Ok(stats) => Ok(stats),
            Err(e) => {
                warn!("{}: cleaning failed: {}. Discarding its contents.", path.display(), e);
                match discard_contents(path) {
                    Ok(()) => Err(e),
                    Err(discard) => {
                        error!("{}: could not discard contents: {}", path.display(), discard);
                        Err(CleanerError::Fatal(format!(
                            "{}: cleaning failed ({}) and the original could not be discarded ({})",
                            path.display(),
                            e,
                            discard
                        )))
                    }
                }
            }
        }
    }

    fn rewrite(
        &self,
        path: &Path,
        metadata: &fs::Metadata,
        no_obfuscate: &[Category],
    ) -> Result<FileStats, CleanerError> {
        let mut stats = FileStats::default();
        let source_id = path.display().to_string();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut reader = BufReader::new(File::open(path)?);
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            let mut buf = Vec::with_capacity(8 * 1024);
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf)? == 0 {
                    break;
                }
                stats.lines_read += 1;
                let line = String::from_utf8_lossy(&buf);
                match self.processor.process(&line, no_obfuscate)? {
                    LineOutcome::Dropped { pattern } => {
                        stats.lines_dropped += 1;
                        log_dropped_line_debug(&source_id, stats.lines_read, &pattern);
                    }
                    LineOutcome::Kept {
                        text,
                        substitutions,
                    } => {
                        writer.write_all(text.as_bytes())?;
                        merge_counts(&mut stats.substitutions, &substitutions);
                    }
                }
            }
            writer.flush()?;
        }

        if stats.is_untouched() {
            debug!("{}: no changes, original kept", source_id);
            return Ok(stats);
        }

        tmp.as_file().set_permissions(metadata.permissions())?;
        tmp.persist(path).map_err(|e| CleanerError::Io(e.error))?;
        debug!(
            "{}: {} line(s), {} dropped, {} substitution(s)",
            source_id,
            stats.lines_read,
            stats.lines_dropped,
            stats.total_substitutions()
        );
        Ok(stats)
    }
}

/// Truncates `path` to zero bytes, removing it if it cannot be opened for
/// writing.
fn discard_contents(path: &Path) -> Result<(), CleanerError> {
    match OpenOptions::new().write(true).truncate(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            debug!("{}: truncation failed ({}), removing", path.display(), e);
            fs::remove_file(path).map_err(CleanerError::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObfuscationConfig;
    use crate::mapping::{compute_run_seed, MappingStore};
    use crate::matcher::PatternMatcher;
    use crate::sanitizers::compiler::{compile_patterns, CompiledPatterns};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn setup(patterns: &[&str]) -> (PatternMatcher, MappingStore, ObfuscationConfig) {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        let matcher = PatternMatcher::new(None, &[], Arc::new(compile_patterns(&patterns).unwrap())).unwrap();
        let store = MappingStore::new(&compute_run_seed("file-tests").unwrap(), None);
        (matcher, store, ObfuscationConfig::new(true, false, false))
    }

    #[test]
    fn test_clean_rewrites_and_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ip_addr");
        fs::write(&path, "inet 10.0.2.155/24\nsecret line\ninet 10.0.2.155\n").unwrap();

        let (matcher, store, obf) = setup(&["^secret"]);
        let cleaner = FileCleaner::new(LineProcessor::new(&matcher, &store, &obf, false));
        let stats = cleaner.clean(&path, &[]).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "inet 10.230.230.1/24\ninet 10.230.230.1\n"
        );
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.lines_dropped, 1);
        assert_eq!(stats.substitutions.get(&Category::Ipv4), Some(&2));
    }

    #[test]
    fn test_empty_file_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, "").unwrap();
        let (matcher, store, obf) = setup(&[]);
        let cleaner = FileCleaner::new(LineProcessor::new(&matcher, &store, &obf, false));
        assert_eq!(cleaner.clean(&path, &[]).unwrap(), FileStats::default());
    }

    #[test]
    fn test_invalid_utf8_untouched_when_nothing_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary");
        let bytes = vec![0xff, 0xfe, b'a', b'\n', 0x80];
        fs::write(&path, &bytes).unwrap();
        let (matcher, store, obf) = setup(&[]);
        let cleaner = FileCleaner::new(LineProcessor::new(&matcher, &store, &obf, false));
        let stats = cleaner.clean(&path, &[]).unwrap();
        assert_eq!(stats.lines_read, 2);
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "10.0.0.1 db\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let (matcher, store, obf) = setup(&[]);
        let cleaner = FileCleaner::new(LineProcessor::new(&matcher, &store, &obf, false));
        cleaner.clean(&path, &[]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(fs::read_to_string(&path).unwrap(), "10.230.230.1 db\n");
    }

    #[test]
    fn test_failed_file_keeps_no_original_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("addrs");
        // Sixteen one-digit IPv6 originals share sixteen possible stand-ins;
        // under this run id the last one finds no free value.
        let mut content = String::from("secret 10.1.2.3\n");
        for digit in "0123456789abcdef".chars() {
            content.push_str(&format!("::{}\n", digit));
        }
        fs::write(&path, &content).unwrap();

        let matcher = PatternMatcher::new(None, &[], Arc::new(CompiledPatterns::default())).unwrap();
        let store = MappingStore::new(&compute_run_seed("exhausted-ipv6-13").unwrap(), None);
        let obf = ObfuscationConfig::new(true, true, false);
        let cleaner = FileCleaner::new(LineProcessor::new(&matcher, &store, &obf, false));

        let err = cleaner.clean(&path, &[]).unwrap_err();
        assert!(matches!(err, CleanerError::AllocationExhausted(Category::Ipv6, _)));
        let left = fs::read_to_string(&path).unwrap_or_default();
        assert!(!left.contains("10.1.2.3"));
        assert!(!left.contains("::f"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_file_is_error_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let (matcher, store, obf) = setup(&[]);
        let cleaner = FileCleaner::new(LineProcessor::new(&matcher, &store, &obf, false));
        assert!(cleaner.clean(&dir.path().join("gone"), &[]).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
