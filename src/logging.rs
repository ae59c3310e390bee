//! Logging setup for the replay binary
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary. `RUST_LOG` takes precedence over the `-v` count.

use tracing_subscriber::EnvFilter;

/// Map a `-v` count onto a default filter directive
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber
///
/// Calling this more than once is harmless; only the first call installs.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
