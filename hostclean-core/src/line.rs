//! Single-line processing: drop check, then per-category substitution.
//!
//! A line is held as a list of segments. Text a category has already
//! replaced becomes a `Replaced` segment and is invisible to every later
//! category, so a stand-in is never itself re-obfuscated.
//!
//! License: MIT OR APACHE 2.0

use std::ops::Range;

use crate::category::Category;
use crate::config::ObfuscationConfig;
use crate::errors::CleanerError;
use crate::mapping::MappingStore;
use crate::matcher::PatternMatcher;
use crate::stats::CategoryCounts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line matched a drop pattern and must not be written.
    Dropped { pattern: String },
    /// The line to write, terminator included.
    Kept {
        text: String,
        substitutions: CategoryCounts,
    },
}

#[derive(Debug)]
enum Segment {
    Raw(Range<usize>),
    Replaced(String),
}

/// Splits a trailing `\n` or `\r\n` from the body of a line.
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Borrowed view of everything needed to clean lines for one run.
#[derive(Debug, Clone, Copy)]
pub struct LineProcessor<'a> {
    matcher: &'a PatternMatcher,
    store: &'a MappingStore,
    obfuscation: &'a ObfuscationConfig,
    keywords_enabled: bool,
}

impl<'a> LineProcessor<'a> {
    pub fn new(
        matcher: &'a PatternMatcher,
        store: &'a MappingStore,
        obfuscation: &'a ObfuscationConfig,
        keywords_enabled: bool,
    ) -> Self {
        Self {
            matcher,
            store,
            obfuscation,
            keywords_enabled,
        }
    }

    fn category_active(&self, category: Category, no_obfuscate: &[Category]) -> bool {
        if no_obfuscate.contains(&category) {
            return false;
        }
        match category {
            Category::Keyword => self.keywords_enabled,
            other => self.obfuscation.is_enabled(other),
        }
    }

    /// Cleans one line. `no_obfuscate` suppresses categories for the
    /// current file only; drop patterns always apply.
    pub fn process(&self, line: &str, no_obfuscate: &[Category]) -> Result<LineOutcome, CleanerError> {
        let (body, terminator) = split_terminator(line);
        let mut substitutions = CategoryCounts::new();

        if body.is_empty() {
            return Ok(LineOutcome::Kept {
                text: line.to_string(),
                substitutions,
            });
        }

        if let Some(pattern) = self.matcher.drop_match(body) {
            return Ok(LineOutcome::Dropped {
                pattern: pattern.to_string(),
            });
        }

        let mut segments = vec![Segment::Raw(0..body.len())];
        for category in Category::PRIORITY {
            if !self.category_active(category, no_obfuscate) {
                continue;
            }
            let mut next = Vec::with_capacity(segments.len());
            let mut count = 0u64;
            for segment in segments {
                let Segment::Raw(window) = segment else {
                    next.push(segment);
                    continue;
                };
                let found = self.matcher.find(category, body, window.clone());
                if found.is_empty() {
                    next.push(Segment::Raw(window));
                    continue;
                }
                let mut cursor = window.start;
                for m in found {
                    if m.range.start > cursor {
                        next.push(Segment::Raw(cursor..m.range.start));
                    }
                    let obfuscated = self.store.get_or_create(category, &m.original)?;
                    next.push(Segment::Replaced(obfuscated));
                    count += 1;
                    cursor = m.range.end;
                }
                if cursor < window.end {
                    next.push(Segment::Raw(cursor..window.end));
                }
            }
            segments = next;
            if count > 0 {
                substitutions.insert(category, count);
            }
        }

        let mut text = String::with_capacity(line.len());
        for segment in &segments {
            match segment {
                Segment::Raw(r) => text.push_str(&body[r.clone()]),
                Segment::Replaced(s) => text.push_str(s),
            }
        }
        text.push_str(terminator);

        Ok(LineOutcome::Kept { text, substitutions })
    }
}
