//! Logging through `tracing` and `tracing-subscriber`.
//!
//! Log lines go to stderr so that reports written to stdout stay parseable.
//!
//! - `warn`: missing stylesheet or fixture directories
//! - `info`: matrix size, engine in use
//! - `debug`: skipped cases, stylesheets without fixtures, engine exits
//! - `trace`: parsed documents

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            with_ansi: atty::is(atty::Stream::Stderr),
        }
    }
}

impl LogConfig {
    /// Maps `-v`/`-q` counts to a level, starting from `warn`.
    ///
    /// - `-q`: error
    /// - none: warn
    /// - `-v`: info
    /// - `-vv`: debug
    /// - `-vvv` and up: trace
    #[must_use]
    pub fn from_verbosity(verbose: u8, quiet: u8) -> Self {
        let level = match i16::from(verbose) - i16::from(quiet) {
            i16::MIN..=-1 => Level::ERROR,
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `config`.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,xsltest={}", level))
    });
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_mapping() {
        assert_eq!(LogConfig::from_verbosity(0, 0).level, Level::WARN);
        assert_eq!(LogConfig::from_verbosity(1, 0).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(2, 0).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5, 0).level, Level::TRACE);
        assert_eq!(LogConfig::from_verbosity(0, 1).level, Level::ERROR);
        assert_eq!(LogConfig::from_verbosity(1, 1).level, Level::WARN);
    }
}
