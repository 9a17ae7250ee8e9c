//! Log output for the `vg` binary.
//!
//! Library code logs through the `log` facade; this installs a `tracing`
//! subscriber that picks those records up and writes them to stderr, keeping
//! stdout for command output.

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `fallback` (the CLI flag or the configured level).
fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(fallback: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(fallback))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
