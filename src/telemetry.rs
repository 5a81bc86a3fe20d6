//! Tracing subscriber setup for the binary.
//!
//! - `FASTMATH_LOG` holds the filter (`warn` when unset), e.g. `fastmath=debug`.
//! - `FASTMATH_LOG_FORMAT=json` switches to JSON lines.
//!
//! Output goes to stderr so it can be redirected away from the TUI.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FASTMATH_LOG";
pub const LOG_FORMAT_ENV: &str = "FASTMATH_LOG_FORMAT";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // try_init: tests and embedders may have installed a subscriber already
    let _ = match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
}
