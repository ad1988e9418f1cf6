// hostclean/src/cli.rs
//! This file defines the command-line interface (CLI) for the hostclean
//! application, including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "hostclean",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pseudonymize sensitive values across a collected diagnostic archive",
    long_about = "hostclean rewrites every file of a collected archive in place, replacing IPv4/IPv6 addresses, hostnames, MAC addresses and configured keywords with consistent stand-ins, dropping lines that match redaction patterns, and writing CSV reports plus a facts document describing every substitution.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all log output.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Explicitly disable debug logging, even if RUST_LOG is set to DEBUG
    #[arg(long = "disable-debug", global = true, help = "Disable debug logging, overriding RUST_LOG.")]
    pub disable_debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `hostclean` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cleans an archive directory in place and writes the reports.
    #[command(about = "Clean an archive directory in place and write the obfuscation reports.")]
    Clean(CleanCommand),

    /// Parses and compiles a content redaction file without cleaning anything.
    #[command(about = "Validate a content redaction file.")]
    Validate {
        /// Path to the content redaction YAML file.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Treat a file mode other than 0600 as an error.
        #[arg(long = "strict-permissions")]
        strict_permissions: bool,
    },
}

/// Arguments for the `clean` command.
#[derive(Parser, Debug)]
pub struct CleanCommand {
    /// Root directory of the collected archive.
    #[arg(value_name = "ARCHIVE_DIR")]
    pub archive: PathBuf,

    /// Prefix of the report file names (defaults to the archive directory name).
    #[arg(long = "archive-name", value_name = "NAME")]
    pub archive_name: Option<String>,

    /// Content redaction YAML with `patterns` and `keywords`.
    #[arg(long = "redaction-file", value_name = "FILE", env = "HOSTCLEAN_REDACTION_FILE")]
    pub redaction_file: Option<PathBuf>,

    /// Treat a redaction file mode other than 0600 as an error.
    #[arg(long = "strict-permissions")]
    pub strict_permissions: bool,

    /// Obfuscate IPv4 addresses.
    #[arg(long = "obfuscate", env = "HOSTCLEAN_OBFUSCATE")]
    pub obfuscate: bool,

    /// Obfuscate IPv6 addresses.
    #[arg(long = "obfuscate-ipv6", env = "HOSTCLEAN_OBFUSCATE_IPV6")]
    pub obfuscate_ipv6: bool,

    /// Obfuscate the host's hostname.
    #[arg(long = "obfuscate-hostname", env = "HOSTCLEAN_OBFUSCATE_HOSTNAME")]
    pub obfuscate_hostname: bool,

    /// Obfuscate MAC addresses.
    #[arg(long = "obfuscate-mac", env = "HOSTCLEAN_OBFUSCATE_MAC")]
    pub obfuscate_mac: bool,

    /// Comma-separated categories, e.g. `hostname,ipv4`. Replaces the
    /// individual `--obfuscate*` flags when given.
    #[arg(long = "obfuscation-list", value_name = "LIST", env = "HOSTCLEAN_OBFUSCATION_LIST")]
    pub obfuscation_list: Option<String>,

    /// Canonical FQDN of the host (read from the kernel when omitted).
    #[arg(long, value_name = "FQDN", env = "HOSTCLEAN_HOSTNAME")]
    pub hostname: Option<String>,

    /// Directory receiving the CSV reports.
    #[arg(long = "report-dir", value_name = "DIR", env = "HOSTCLEAN_REPORT_DIR")]
    pub report_dir: Option<PathBuf>,

    /// Where to write the facts document.
    #[arg(long = "facts-file", value_name = "FILE", env = "HOSTCLEAN_FACTS_FILE")]
    pub facts_file: Option<PathBuf>,

    /// Do not write the facts document.
    #[arg(long = "no-facts", conflicts_with = "facts_file")]
    pub no_facts: bool,

    /// Pin the run id to make IPv6 output reproducible.
    #[arg(long = "run-id", value_name = "ID", env = "HOSTCLEAN_RUN_ID")]
    pub run_id: Option<String>,

    /// Paths to leave untouched, relative to the archive (comma-separated).
    #[arg(long = "skip", value_name = "PATH", value_delimiter = ',')]
    pub skip: Vec<PathBuf>,

    /// File extensions to leave untouched (comma-separated).
    #[arg(long = "skip-ext", value_name = "EXT", value_delimiter = ',')]
    pub skip_ext: Vec<String>,

    /// Number of worker threads; 1 cleans sequentially.
    #[arg(long, short = 'j', default_value_t = 1, env = "HOSTCLEAN_JOBS")]
    pub jobs: usize,

    /// Print the summary as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Suppress the end-of-run summary.
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}
