//! Tracing bootstrap shared by every AppDesk host process and test harness.

use tracing_subscriber::EnvFilter;

/// Install the JSON `tracing` subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns `false` when a global subscriber is already installed, so test
/// harnesses can call this repeatedly.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .json()
        .try_init()
        .is_ok()
}
