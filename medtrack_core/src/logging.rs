//! Tracing setup shared by the medtrack binaries.
//!
//! `RUST_LOG` always wins; otherwise the level comes from the caller.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging from a `-v` count: 0 = info, 1 = debug, 2+ = trace
pub fn init_with_verbosity(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    init_with_level(level)
}

/// Initialize logging with a specific default filter
///
/// The filter uses `EnvFilter` syntax, so `"info,tower_http=debug"` works.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
