//! Tracing subscriber setup.
//!
//! All log output goes to stderr: the CLI prints its tables (speeds, bouts,
//! tail angles) on stdout and they must stay machine-readable.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter directive used by `--verbose`.
pub const VERBOSE_LEVEL: &str = "debug";

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `config.level`. Calling it twice is harmless; the first call wins.
pub fn init_logging(config: &LoggingConfig) {
    let filter = build_filter(&config.level);

    let installed = if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// `config` with its level raised to [`VERBOSE_LEVEL`] when `verbose` is set.
pub fn with_verbosity(config: &LoggingConfig, verbose: bool) -> LoggingConfig {
    let mut effective = config.clone();
    if verbose {
        effective.level = VERBOSE_LEVEL.to_string();
    }
    effective
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_level_only() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            json: true,
        };
        let quiet = with_verbosity(&config, false);
        assert_eq!(quiet, config);

        let loud = with_verbosity(&config, true);
        assert_eq!(loud.level, VERBOSE_LEVEL);
        assert!(loud.json);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(&LoggingConfig::default());
        init_logging(&LoggingConfig::default());
    }
}
