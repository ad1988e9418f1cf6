//! The canonical facts document summarizing a run's obfuscation state.
//!
//! A flat JSON object. Toggles are booleans; each mapping list is itself a
//! JSON-encoded string holding an array of `{original, obfuscated}` objects,
//! because consumers of the facts file only accept scalar values.
//!
//! License: MIT OR APACHE 2.0

use log::info;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::category::Category;
use crate::config::ObfuscationConfig;
use crate::errors::CleanerError;
use crate::mapping::MappingStore;

/// Default location of the facts document.
pub const DEFAULT_FACTS_PATH: &str = "/etc/rhsm/facts/insights-client.facts";

const FACTS_PREFIX: &str = "insights_client";

#[cfg(unix)]
const FACTS_MODE: u32 = 0o644;

#[derive(Debug, Serialize)]
struct FactEntry<'a> {
    original: &'a str,
    obfuscated: &'a str,
}

/// Builds the facts object. Categories that are disabled (or keywords when
/// none are configured) get an empty `"[]"` list.
pub fn build_facts(
    hostname: Option<&str>,
    obfuscation: &ObfuscationConfig,
    keywords_enabled: bool,
    store: &MappingStore,
) -> Result<Map<String, Value>, CleanerError> {
    let mut facts = Map::new();
    facts.insert(
        format!("{}.hostname", FACTS_PREFIX),
        Value::String(hostname.unwrap_or_default().to_string()),
    );

    for category in Category::PRIORITY {
        let enabled = match category {
            Category::Keyword => keywords_enabled,
            other => {
                let on = obfuscation.is_enabled(other);
                facts.insert(
                    format!("{}.obfuscate_{}_enabled", FACTS_PREFIX, other.facts_slug()),
                    Value::Bool(on),
                );
                on
            }
        };

        let entries = if enabled { store.export(category)? } else { Vec::new() };
        let list: Vec<FactEntry<'_>> = entries
            .iter()
            .map(|e| FactEntry {
                original: &e.original,
                obfuscated: &e.obfuscated,
            })
            .collect();
        let encoded = serde_json::to_string(&list)
            .map_err(|e| CleanerError::Fatal(format!("Failed to encode {} facts: {}", category, e)))?;
        facts.insert(
            format!("{}.obfuscated_{}", FACTS_PREFIX, category.facts_slug()),
            Value::String(encoded),
        );
    }
    Ok(facts)
}

fn write_facts_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Explicit chmod so the process umask has no say.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(FACTS_MODE))?;
    }
    Ok(())
}

/// Serializes `facts` and writes them atomically to `path`.
pub fn write_facts(path: &Path, facts: &Map<String, Value>) -> Result<PathBuf, CleanerError> {
    let body = serde_json::to_vec_pretty(facts)
        .map_err(|e| CleanerError::Fatal(format!("Failed to serialize facts: {}", e)))?;
    write_facts_file(path, &body).map_err(|source| CleanerError::Facts {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote obfuscation facts to {}", path.display());
    Ok(path.to_path_buf())
}
