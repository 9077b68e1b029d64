use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a tracing filter, e.g. `dirsnap_ops=debug`.
pub const LOG_ENV: &str = "DIRSNAP_LOG";

/// Install the global subscriber. Logs go to stderr so they never mix with
/// status lines on stdout.
pub fn init_logger(verbosity: u8) {
    let filter = match env::var(LOG_ENV) {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => EnvFilter::new(default_level(verbosity)),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
