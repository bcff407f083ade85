//! Terminal logging.
//!
//! Logs go to stderr so the quiz view on stdout stays readable. `QUIZ_LOG`
//! takes an `EnvFilter` directive; without it the level is `info`, and
//! `DEBUG_LOGGING=1` turns on debug output for the workspace crates.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEBUG_DIRECTIVE: &str = "info,app=debug,services=debug,quiz_core=debug";
const DEFAULT_DIRECTIVE: &str = "info";

pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if debug_logging {
            DEBUG_DIRECTIVE
        } else {
            DEFAULT_DIRECTIVE
        })
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "logging initialized");
}
