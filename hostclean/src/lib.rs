// hostclean/src/lib.rs
//! # Hostclean CLI Application
//!
//! Command-line front end for `hostclean-core`: argument parsing, logging
//! setup and the end-of-run summary.

pub mod cli;
pub mod commands;
pub mod logger;
