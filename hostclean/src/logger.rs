// hostclean/src/logger.rs
//! Logger setup for the hostclean CLI.

use log::LevelFilter;

/// Initializes `env_logger` once for the process.
///
/// `RUST_LOG` is honored when `level` is `None`; otherwise `level` wins for
/// every module. Without either, warnings and errors are shown. Calling this
/// again after a logger is installed is a no-op.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None);
    let _ = builder.try_init();
}
