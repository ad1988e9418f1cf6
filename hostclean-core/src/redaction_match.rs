// hostclean-core/src/redaction_match.rs
//! PII-safe debug logging helpers for substitutions and dropped lines.
//!
//! Originals are sensitive by definition, so debug logs mask them unless
//! `HOSTCLEAN_ALLOW_DEBUG_PII=true` is set in the environment.

use lazy_static::lazy_static;
use log::debug;

use crate::category::Category;

lazy_static! {
    /// Read once: whether originals may appear verbatim in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("HOSTCLEAN_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_new_mapping_debug(category: Category, original: &str, obfuscated: &str) {
    debug!(
        "New {} mapping: Original='{}', Obfuscated='{}'",
        category,
        get_loggable_content(original),
        obfuscated
    );
}

pub fn log_dropped_line_debug(source_id: &str, line_number: u64, pattern: &str) {
    debug!(
        "{}:{} dropped by pattern '{}'",
        source_id, line_number, pattern
    );
}
