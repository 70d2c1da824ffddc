//! Log output for the docviewer binaries.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber writing to stderr.
///
/// `filter` is an `EnvFilter` directive such as `"info"` or
/// `"docviewer=debug"`. An invalid directive falls back to `info`. Calling
/// this twice is harmless; the second call is ignored.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
