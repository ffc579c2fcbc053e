//! Logging setup.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing`, writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise warnings only, or everything down to
/// debug when `debug` is set.
pub fn init_tracing(debug: bool) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let default_level = if debug { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(env_filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}
