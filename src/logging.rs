//! Logging setup. Everything goes to stderr so stdout stays clean for
//! the JSON responses the binary prints.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// The filter defaults to `info` for this crate and can be overridden
/// through `RUST_LOG`.
pub fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("db_charter=info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
