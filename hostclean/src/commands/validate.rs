// hostclean/src/commands/validate.rs
//! `hostclean validate`: checks a content redaction file.

use anyhow::Result;
use std::io::Write;
use std::path::Path;

use hostclean_core::RedactionConfig;

/// Loads and compiles `path`, then reports what it contains.
pub fn run_validate<W: Write>(path: &Path, strict_permissions: bool, out: &mut W) -> Result<()> {
    let config = RedactionConfig::load_from_file(path, strict_permissions)?;
    writeln!(
        out,
        "{}: OK ({} pattern(s), {} keyword(s))",
        path.display(),
        config.patterns().len(),
        config.keywords().len()
    )?;
    Ok(())
}
