//! Per-command logging context
//!
//! The logger is constructed explicitly when a command starts and torn down
//! when the returned guard drops, rather than living as reconfigurable
//! process-global state. One command invocation, one context.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Build and install the logging context for one command invocation.
///
/// `debug` raises the filter to debug level and includes source locations;
/// `RUST_LOG` still takes precedence when set. Hold the guard for the
/// lifetime of the command.
pub fn init_command_logging(debug: bool) -> DefaultGuard {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .finish();

    tracing::subscriber::set_default(subscriber)
}
