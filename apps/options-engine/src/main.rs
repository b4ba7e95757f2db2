//! Options Engine Binary
//!
//! Runs a seeded backtest with the built-in strategy selector and prints the
//! performance summary as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! OPTIONS_ENGINE_CONFIG=backtest.yaml cargo run --bin options-engine
//! ```
//!
//! # Environment Variables
//!
//! - `OPTIONS_ENGINE_CONFIG`: YAML config path (default: built-in defaults)
//! - `RUST_LOG`: log filter, overrides `logging.level`

use anyhow::Context;
use options_engine::config::{CONFIG_PATH_ENV, Config, load_config, validate_config};
use options_engine::observability::{describe_metrics, init_tracing};
use options_engine::{Command, CommandOutput, Controller};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Missing .env is fine.
    let _ = dotenvy::dotenv();

    let (config, source) = load()?;
    init_tracing(&config.logging).context("failed to initialize tracing")?;
    describe_metrics();
    info!(
        source = %source,
        symbol = %config.simulation.symbol,
        seed = config.simulation.seed,
        horizon_days = config.simulation.horizon_days,
        "Configuration loaded"
    );

    let mut controller = Controller::from_config(&config)?;
    let output = controller.dispatch(Command::RunBacktest {
        days: config.simulation.horizon_days,
    })?;
    let CommandOutput::Backtest(result) = output else {
        anyhow::bail!("unexpected output for a backtest command");
    };

    let summary = serde_json::json!({
        "symbol": config.simulation.symbol,
        "seed": config.simulation.seed,
        "days": result.days,
        "degraded_days": result.degraded_days,
        "halted": result.halted,
        "trades": result.trades,
        "final_metrics": result.final_metrics,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load() -> anyhow::Result<(Config, String)> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => {
            let config = load_config(Some(&path)).with_context(|| format!("loading {path}"))?;
            Ok((config, path))
        }
        Err(_) => {
            let config = Config::default();
            validate_config(&config)?;
            Ok((config, "defaults".to_string()))
        }
    }
}
