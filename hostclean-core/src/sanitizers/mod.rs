//! Drop-pattern compilation for hostclean.
//!
//! Patterns from the redaction configuration are compiled exactly once per
//! run and handed to the line processor; nothing is recompiled per line.

pub mod compiler;
