//! Verbosity-gated logging
//!
//! Run verbosity maps onto tracing levels:
//!
//! | verbosity | shown                              | filter |
//! |-----------|------------------------------------|--------|
//! | 0         | critical (`error!`, `warn!`)       | WARN   |
//! | 1         | + per-keystore progress (`info!`)  | INFO   |
//! | 2         | + details, config dump (`debug!`)  | DEBUG  |
//! | 3+        | + per-chunk tracing (`trace!`)     | TRACE  |
//!
//! `RUST_LOG` takes precedence when set. Panic reports (including engine
//! panics the loader recovers from) are routed through the same channel.

use std::panic;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Map a verbosity level to the most detailed tracing level it shows
pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber, writing to stderr
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter(verbosity).into())
        .from_env_lossy();

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();

    install_panic_hook();
}

/// Report panics as `error!` events instead of the default stderr dump
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panicked");
    }));
}
