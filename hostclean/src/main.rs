// hostclean/src/main.rs
//! hostclean entry point.
//!
//! Loads `.env`, initializes logging and dispatches the subcommand. Only
//! fatal errors produce a non-zero exit status; files that could not be
//! cleaned are reported as warnings and in the summary.

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};
use std::process::ExitCode;

use hostclean::cli::{Cli, Commands};
use hostclean::commands::{clean::run_clean, validate::run_validate};
use hostclean::logger;

fn run(cli: Cli) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Clean(cmd) => {
            run_clean(&cmd, &mut stdout)?;
        }
        Commands::Validate {
            file,
            strict_permissions,
        } => run_validate(&file, strict_permissions, &mut stdout)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else if cli.disable_debug {
        Some(LevelFilter::Info)
    } else {
        None
    };
    logger::init_logger(level);
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
