//! Logging bootstrap using `tracing` and `tracing-subscriber`

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// The verbose flag raises the default level from info to debug;
/// `RUST_LOG` overrides either default. Messages go to stderr so the
/// merged output can be piped cleanly.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
