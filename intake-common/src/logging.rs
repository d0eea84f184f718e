//! Tracing initialization
//!
//! The core itself only emits `tracing` events; subscriber setup is
//! offered here for the embedding orchestrator and for integration
//! tests.

use tracing_subscriber::EnvFilter;

/// Initialize a fmt subscriber with an env-filter.
///
/// Reads `RUST_LOG` when set, otherwise falls back to the given
/// default directive. Safe to call more than once; later calls are
/// no-ops.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
