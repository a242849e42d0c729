//! Logging setup for providers.
//!
//! All logs go to **stderr**; stdout is reserved for the single RPCPlugin
//! handshake line emitted by [`crate::server::serve`].
//!
//! ```ignore
//! use tfplug::logging::init_logging;
//!
//! fn main() {
//!     init_logging();
//!     tracing::info!("provider starting");
//! }
//! ```

use crate::server::LogLevel;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

impl LogLevel {
    fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Initialize the default logging subscriber, reading `RUST_LOG` and
/// defaulting to `info`. Panics if a global subscriber is already set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`] but with a caller-supplied default level, used when
/// `RUST_LOG` is unset.
pub fn init_logging_with_default(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}

/// Try to initialize logging, returning `false` instead of panicking if a
/// subscriber is already set. Used internally by [`crate::server::serve`] so
/// repeated or test invocations don't abort the process.
pub fn try_init_logging(default_level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}
