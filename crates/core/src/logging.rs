//! Diagnostic logging bootstrap.
//!
//! Logging goes to stderr so that callers remain free to use stdout.
//! `RUST_LOG` always wins; otherwise the `debug` flag picks the level.

use tracing_subscriber::EnvFilter;

use crate::config::ScrapyardConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "scrapyard_core=debug,scrapyard_client=debug" } else { "warn" }
}

/// Install a global subscriber for the given configuration.
///
/// Does nothing if a global subscriber is already installed.
pub fn init(config: &ScrapyardConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(config.debug)));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            retry = config.retry,
            connections = config.connections,
            cache = ?config.cache,
            "diagnostic logging enabled"
        );
    }
}
