//! Logging - `tracing` subscriber for the library and both binaries
//!
//! Writes to stderr so stdout stays machine-readable (CLI JSON, the deployed address).
//! `RUST_LOG` sets the filter (default `info`); `WHITELIST_LOG_JSON=1` switches to JSON lines.

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::paths::env;

pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(env::LOG_JSON)
        .map(|value| value == "1")
        .unwrap_or(false);

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
