//! Logging utilities
//!
//! The engine logs through the `log` facade; `env_logger` is the sink.

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system from `RUST_LOG`
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with a default level
///
/// `RUST_LOG` still overrides `level` when set.
pub fn init_with_level(level: &str) {
    let filter = parse_level(level);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}

/// Map a textual level ("info", "debug", ...) to a filter, defaulting to `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}
