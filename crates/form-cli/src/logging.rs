//! Log setup for the CLI.
//!
//! Events go to stderr so stdout stays clean for XML and JSON output.
//! `RUST_LOG` wins when it is set; otherwise the `-v` count picks the level:
//!
//! - 0: `warn`
//! - 1: `info`
//! - 2: `debug`
//! - 3+: `trace`

use std::io;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Installs the global subscriber. A second call is ignored.
pub fn init_logging(verbosity: u8) {
    let _ = fmt()
        .with_env_filter(build_env_filter(level_for(verbosity)))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(7), Level::TRACE);
    }
}
