//! Diagnostic tracing for the build pipeline.
//!
//! Stage progress and failures are emitted as `tracing` events on stderr.
//! `RUST_LOG` takes precedence; otherwise the level is `warn`, or `info` for
//! the `agentgen` target when running verbose.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=agentgen=debug agentgen build out all
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("warn,agentgen=info")
    } else {
        EnvFilter::new("warn")
    }
}
