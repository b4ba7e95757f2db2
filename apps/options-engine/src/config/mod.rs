//! Configuration module for the options engine.
//!
//! Loads YAML with environment variable interpolation and validates value
//! ranges before anything is built from it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use options_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("backtest.yaml"))?;
//!
//! println!("horizon: {} days", config.simulation.horizon_days);
//! ```

mod analysis;
mod exits;
mod feed;
mod logging;
mod risk;
mod selector;
mod simulation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use analysis::AnalysisConfig;
pub use exits::ExitConfig;
pub use feed::FeedConfig;
pub use logging::LoggingConfig;
pub use risk::{EntryWindow, RiskConfig};
pub use selector::SelectorConfig;
pub use simulation::SimulationConfig;

/// Environment variable naming the config file used by the binary.
pub const CONFIG_PATH_ENV: &str = "OPTIONS_ENGINE_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Portfolio simulation settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Analysis report settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Admission control settings.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Early exit thresholds.
    #[serde(default)]
    pub exits: ExitConfig,
    /// Live feed timeouts and queue sizing.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Built-in selector settings.
    #[serde(default)]
    pub selector: SelectorConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
pub fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` naming the first out-of-range field.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let sim = &config.simulation;
    if !sim.initial_capital.is_finite() || sim.initial_capital <= 0.0 {
        return Err(invalid("simulation.initial_capital must be positive"));
    }
    if !(sim.risk_per_trade > 0.0 && sim.risk_per_trade <= 1.0) {
        return Err(invalid("simulation.risk_per_trade must be within (0, 1]"));
    }
    if sim.max_concurrent_positions == 0 {
        return Err(invalid("simulation.max_concurrent_positions must be at least 1"));
    }
    if sim.horizon_days == 0 {
        return Err(invalid("simulation.horizon_days must be at least 1"));
    }
    if sim.trading_interval_days == 0 {
        return Err(invalid("simulation.trading_interval_days must be at least 1"));
    }
    if sim.paths == 0 {
        return Err(invalid("simulation.paths must be at least 1"));
    }
    if sim.symbol.trim().is_empty() {
        return Err(invalid("simulation.symbol must not be empty"));
    }
    if !sim.initial_price.is_finite() || sim.initial_price <= 0.0 {
        return Err(invalid("simulation.initial_price must be positive"));
    }
    if !sim.volatility.is_finite() || sim.volatility <= 0.0 {
        return Err(invalid("simulation.volatility must be positive"));
    }
    if !sim.risk_free_rate.is_finite() || !(-1.0..=1.0).contains(&sim.risk_free_rate) {
        return Err(invalid("simulation.risk_free_rate must be between -1.0 and 1.0"));
    }

    if config.analysis.curve_points == 0 {
        return Err(invalid("analysis.curve_points must be at least 1"));
    }
    if !(config.analysis.curve_range > 0.0 && config.analysis.curve_range < 1.0) {
        return Err(invalid("analysis.curve_range must be within (0, 1)"));
    }

    if !(config.risk.naked_margin_rate > 0.0 && config.risk.naked_margin_rate <= 1.0) {
        return Err(invalid("risk.naked_margin_rate must be within (0, 1]"));
    }
    if !(0.0..=1.0).contains(&config.risk.min_confidence) {
        return Err(invalid("risk.min_confidence must be between 0.0 and 1.0"));
    }

    for window in &config.risk.entry_windows {
        if window.min_days < 0 || window.min_days > window.max_days {
            return Err(invalid(format!(
                "risk.entry_windows for {} must satisfy 0 <= min_days <= max_days",
                window.kind
            )));
        }
    }

    if !(config.exits.profit_target_pct > 0.0) {
        return Err(invalid("exits.profit_target_pct must be positive"));
    }
    if !(config.exits.stop_loss_pct > 0.0) {
        return Err(invalid("exits.stop_loss_pct must be positive"));
    }
    if let Some(fraction) = config.exits.time_exit_fraction
        && !(fraction > 0.0 && fraction <= 1.0)
    {
        return Err(invalid("exits.time_exit_fraction must be within (0, 1]"));
    }

    if config.feed.timeout_ms == 0 {
        return Err(invalid("feed.timeout_ms must be positive"));
    }
    if config.feed.queue_capacity == 0 {
        return Err(invalid("feed.queue_capacity must be at least 1"));
    }

    if config.selector.kinds.is_empty() {
        return Err(invalid("selector.kinds must list at least one strategy kind"));
    }
    let offsets = config.selector.condor_offsets;
    if offsets.windows(2).any(|w| w[0] >= w[1]) || offsets[0] <= 0.0 {
        return Err(invalid("selector.condor_offsets must be positive and strictly increasing"));
    }
    if !(config.selector.wing_offset > 0.0 && config.selector.wing_offset < 1.0) {
        return Err(invalid("selector.wing_offset must be within (0, 1)"));
    }
    if !(config.selector.strike_increment > 0.0) {
        return Err(invalid("selector.strike_increment must be positive"));
    }
    if config.selector.days_to_expiry < 1 || config.selector.long_vol_days_to_expiry < 1 {
        return Err(invalid("selector days to expiry must be at least 1"));
    }
    if !(0.0..=1.0).contains(&config.selector.confidence) {
        return Err(invalid("selector.confidence must be between 0.0 and 1.0"));
    }

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(format!(
            "logging.format must be one of: {valid_formats:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrategyKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert!((config.simulation.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert!((config.simulation.risk_per_trade - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.simulation.max_concurrent_positions, 5);
        assert_eq!(config.simulation.horizon_days, 60);
        assert_eq!(config.simulation.trading_interval_days, 5);
        assert_eq!(config.simulation.paths, 10_000);
        assert_eq!(config.simulation.seed, 42);
        assert!((config.exits.profit_target_pct - 0.5).abs() < f64::EPSILON);
        assert!((config.exits.stop_loss_pct - 0.5).abs() < f64::EPSILON);
        assert!(config.risk.min_confidence.abs() < f64::EPSILON);
        assert_eq!(config.feed.timeout_ms, 5000);
        assert_eq!(config.feed.queue_capacity, 32);
        assert_eq!(config.selector.condor_offsets, [0.90, 0.95, 1.05, 1.10]);
        assert_eq!(config.exits.time_exit_fraction, Some(0.5));
        assert_eq!(config.risk.entry_windows.len(), 3);
    }

    #[test]
    fn test_entry_windows_override_and_validation() {
        let yaml = r"
risk:
  entry_windows:
    - kind: CALL_SPREAD
      min_days: 7
      max_days: 60
exits:
  time_exit_fraction: null
";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load entry windows: {e}"),
        };
        assert_eq!(config.risk.entry_windows.len(), 1);
        assert_eq!(config.risk.entry_windows[0].kind, StrategyKind::CallSpread);
        assert!(config.risk.entry_windows[0].contains(60));
        assert!(!config.risk.entry_windows[0].contains(61));
        assert_eq!(config.exits.time_exit_fraction, None);

        let inverted = r"
risk:
  entry_windows:
    - kind: IRON_CONDOR
      min_days: 45
      max_days: 30
";
        assert!(matches!(
            load_config_from_string(inverted),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let config = match load_config_from_string("{}") {
            Ok(c) => c,
            Err(e) => panic!("should load empty config: {e}"),
        };
        assert_eq!(config.simulation.horizon_days, 60);
        assert_eq!(config.analysis.curve_points, 50);
    }

    #[test]
    fn test_load_partial_sections() {
        let yaml = r"
simulation:
  horizon_days: 20
  seed: 7
selector:
  kinds: [IRON_CONDOR, CALL_SPREAD]
logging:
  format: pretty
";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load partial config: {e}"),
        };
        assert_eq!(config.simulation.horizon_days, 20);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.paths, 10_000);
        assert_eq!(
            config.selector.kinds,
            vec![StrategyKind::IronCondor, StrategyKind::CallSpread]
        );
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "seed: ${OPTIONS_ENGINE_TEST_NONEXISTENT_VAR:-11}";
        assert_eq!(interpolate_env_vars(input), "seed: 11");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "symbol: ${OPTIONS_ENGINE_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "symbol: ");
    }

    #[test]
    fn test_interpolated_value_reaches_config() {
        let yaml = "simulation:\n  horizon_days: ${OPTIONS_ENGINE_TEST_HORIZON_UNSET:-15}\n";
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load interpolated config: {e}"),
        };
        assert_eq!(config.simulation.horizon_days, 15);
    }

    #[test]
    fn test_validation_risk_fraction() {
        for value in ["0", "1.5", "-0.1"] {
            let yaml = format!("simulation:\n  risk_per_trade: {value}\n");
            let Err(err) = load_config_from_string(&yaml) else {
                panic!("expected error for risk_per_trade {value}");
            };
            assert!(err.to_string().contains("risk_per_trade"));
        }
    }

    #[test]
    fn test_validation_zero_paths() {
        let Err(err) = load_config_from_string("simulation:\n  paths: 0\n") else {
            panic!("expected error for zero paths");
        };
        assert!(err.to_string().contains("paths"));
    }

    #[test]
    fn test_validation_exit_fraction() {
        let Err(err) = load_config_from_string("exits:\n  time_exit_fraction: 1.5\n") else {
            panic!("expected error for exit fraction");
        };
        assert!(err.to_string().contains("time_exit_fraction"));
        assert!(load_config_from_string("exits:\n  time_exit_fraction: 0.5\n").is_ok());
    }

    #[test]
    fn test_validation_log_format() {
        let Err(err) = load_config_from_string("logging:\n  format: xml\n") else {
            panic!("expected error for log format");
        };
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_parse_error() {
        let result = load_config_from_string("simulation: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Some("/nonexistent/options-engine.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
