//! Diagnostic output for the `envrun` binary.
//!
//! Events go to standard error so they never mix with the output of the
//! launched command. Values resolved from backends are never logged.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding an [`EnvFilter`] directive.
pub const LOG_ENV: &str = "ENVRUN_LOG";

/// Builds the filter for this invocation.
///
/// `ENVRUN_LOG` wins when it is set and valid. Otherwise `verbose` selects
/// debug output for envrun and the default is warnings only.
pub fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("envrun=debug")
        } else {
            EnvFilter::new("warn")
        }
    })
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter(verbose));

    // Fails only when a subscriber is already installed.
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
