//! Tracing subscriber initialization.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level is the default
//! directive. Output is JSON or pretty according to `logging.format` and goes
//! to stderr, leaving stdout to the binary's results.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Failure to install the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingInitError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log level '{level}': {message}")]
    InvalidLevel {
        /// Configured level.
        level: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TracingInitError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TracingInitError::InvalidLevel {
        level: config.level.clone(),
        message: e.to_string(),
    })
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error for an invalid level or if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingInitError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.include_target)
        .with_writer(std::io::stderr);

    let result = if config.format == "pretty" {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };
    result.map_err(|e| TracingInitError::AlreadyInstalled(e.to_string()))?;

    tracing::info!(level = %config.level, format = %config.format, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "options_engine=loud".to_string(),
            ..LoggingConfig::default()
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(
                env_filter(&config),
                Err(TracingInitError::InvalidLevel { .. })
            ));
        }
    }

    #[test]
    fn test_valid_level_builds_filter() {
        let config = LoggingConfig::default();
        assert!(env_filter(&config).is_ok());
    }
}
