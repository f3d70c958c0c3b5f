//! Diagnostics for the `benchci` CLI.
//!
//! Tracing output goes to stderr. Report output (tables, JSON, pages) goes to
//! stdout or a file and never passes through the subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Level for the `benchci` target given the number of `-v` flags.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise dependencies log at `warn` and
/// `benchci` at the level chosen by `-v`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,benchci={}", level_for(verbosity))));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1)
                .without_time()
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }

    #[test]
    fn default_directives_parse() {
        for verbosity in 0..4 {
            let directive = format!("warn,benchci={}", level_for(verbosity));
            assert!(EnvFilter::try_new(&directive).is_ok(), "{directive}");
        }
    }
}
