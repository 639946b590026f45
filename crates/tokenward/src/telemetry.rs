//! Log output setup for binaries embedding Tokenward.
//!
//! Libraries only emit `tracing` events. Installing a subscriber is the
//! binary's call; this is the one the demos use.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it twice is harmless: the second call finds a subscriber
/// already installed and does nothing.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
