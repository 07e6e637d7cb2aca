//! Tracing subscriber setup for hosts embedding the worker.
//!
//! Logs go to stderr as JSON so they never mix with whatever the host
//! writes to stdout. Filtering follows `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Panics if one is already installed.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();
}

/// Install the global subscriber unless one is already installed.
pub fn try_init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .try_init()
}
