//! Tracing setup for binaries and tests that embed phaser.
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! host application installs a subscriber. `init` installs a compact stderr
//! subscriber driven by `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=phaser=trace cargo test
//! ```

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "phaser=debug" } else { "warn" }
}

/// Install the global tracing subscriber.
///
/// Returns an error if a global subscriber is already set.
pub fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
