//! Strategy analyzer: one report per strategy, or a ranked batch.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::monte_carlo::expected_value;
use super::payoff::{Bound, breakevens, max_loss, max_profit, pnl_curve};
use super::probability::{Lognormal, analytic_expected_value, probability_of_profit};
use super::report::{AnalysisReport, MarketConditions, Recommendation};
use crate::config::{AnalysisConfig, SimulationConfig};
use crate::domain::{MarketSnapshot, Strategy, StrategyKind, years_between};
use crate::pricing::{PricingError, price_strategy};

/// Inputs controlling one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Monte Carlo paths for EV.
    pub paths: u32,
    /// RNG seed for EV.
    pub seed: u64,
    /// Points on the P&L curve.
    pub curve_points: usize,
    /// Half-width of the P&L curve as a fraction of spot.
    pub curve_range: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            paths: 10_000,
            seed: 42,
            curve_points: 50,
            curve_range: 0.30,
        }
    }
}

impl AnalysisParams {
    /// Combine simulation sampling settings with report settings.
    #[must_use]
    pub const fn from_config(simulation: &SimulationConfig, analysis: &AnalysisConfig) -> Self {
        Self {
            paths: simulation.paths,
            seed: simulation.seed,
            curve_points: analysis.curve_points,
            curve_range: analysis.curve_range,
        }
    }
}

/// Analyze one strategy unit against a snapshot.
///
/// Legs are priced at their own strike's volatility from the snapshot. POP,
/// both EV estimates and the time-to-expiry lognormal use one volatility, the
/// at-the-money value read off the smile at spot. On a skewed smile the
/// theoretical value and Greeks therefore reflect the skew while POP and EV
/// do not.
///
/// # Errors
///
/// Returns a `PricingError` if any leg cannot be priced or the at-the-money
/// volatility is not positive.
pub fn analyze(
    strategy: &Strategy,
    snapshot: &MarketSnapshot,
    params: &AnalysisParams,
) -> Result<AnalysisReport, PricingError> {
    let quote = price_strategy(strategy, snapshot)?;

    let volatility = snapshot.atm_volatility();
    if !volatility.is_finite() || volatility <= 0.0 {
        return Err(PricingError::InvalidVolatility {
            strike: snapshot.price(),
            volatility,
        });
    }

    let time = years_between(snapshot.timestamp(), strategy.expiration());
    let dist = Lognormal {
        spot: snapshot.price(),
        rate: snapshot.risk_free_rate(),
        volatility,
        time,
    };

    let max_profit = max_profit(strategy);
    let max_loss = max_loss(strategy);
    let breakevens = breakevens(strategy);
    let pop = probability_of_profit(strategy, &breakevens, &dist);
    let estimate = expected_value(&dist, params.paths, params.seed, |s| strategy.payoff(s));
    let analytic_ev = analytic_expected_value(strategy, &dist);
    let risk_reward_ratio = risk_reward(max_profit, max_loss);
    let recommendation = Recommendation::grade(estimate.mean, risk_reward_ratio, pop, max_loss);

    debug!(
        kind = %strategy.kind(),
        symbol = strategy.symbol(),
        pop,
        ev = estimate.mean,
        analytic_ev,
        %recommendation,
        "Strategy analyzed"
    );

    Ok(AnalysisReport {
        kind: strategy.kind(),
        symbol: strategy.symbol().to_string(),
        spot: snapshot.price(),
        time_to_expiry: time,
        net_premium: strategy.net_credit(),
        theoretical_value: quote.net_value,
        max_profit,
        max_loss,
        breakevens,
        pop,
        ev: estimate.mean,
        ev_std_error: estimate.std_error,
        ev_paths: estimate.paths,
        analytic_ev,
        greeks: quote.greeks,
        risk_reward_ratio,
        recommendation,
        pnl_curve: pnl_curve(strategy, snapshot.price(), params.curve_range, params.curve_points),
        entry_iv: strategy.average_implied_volatility(),
    })
}

fn risk_reward(max_profit: Bound, max_loss: Bound) -> Option<f64> {
    match (max_profit, max_loss) {
        (Bound::Finite(profit), Bound::Finite(loss)) if loss > 0.0 => Some(profit / loss),
        _ => None,
    }
}

/// A strategy that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonFailure {
    /// Position in the input list.
    pub index: usize,
    /// Strategy kind.
    pub kind: StrategyKind,
    /// Pricing failure message.
    pub error: String,
}

/// Reports ranked by EV, best first, plus the strategies that failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comparison {
    /// Successful reports, EV descending.
    pub ranked: Vec<AnalysisReport>,
    /// Strategies excluded because pricing failed.
    pub failures: Vec<ComparisonFailure>,
    /// Totals over `ranked`; `None` when nothing could be analyzed.
    pub market: Option<MarketConditions>,
}

/// Analyze strategies in parallel and rank them by EV.
///
/// Every strategy sees the same seed, so paths are common across the batch.
#[must_use]
pub fn compare_strategies(
    strategies: &[Strategy],
    snapshot: &MarketSnapshot,
    params: &AnalysisParams,
) -> Comparison {
    let results: Vec<(usize, Result<AnalysisReport, PricingError>)> = strategies
        .par_iter()
        .enumerate()
        .map(|(index, strategy)| (index, analyze(strategy, snapshot, params)))
        .collect();

    let mut comparison = Comparison::default();
    for (index, result) in results {
        match result {
            Ok(report) => comparison.ranked.push(report),
            Err(error) => {
                warn!(index, kind = %strategies[index].kind(), error = %error, "Strategy excluded from comparison");
                comparison.failures.push(ComparisonFailure {
                    index,
                    kind: strategies[index].kind(),
                    error: error.to_string(),
                });
            }
        }
    }
    comparison.ranked.sort_by(|a, b| b.ev.total_cmp(&a.ev));
    comparison.market = MarketConditions::from_reports(&comparison.ranked);
    if let Some(market) = &comparison.market {
        debug!(
            total_ev = market.total_ev,
            average_pop = market.average_pop,
            sentiment = %market.sentiment,
            "Market conditions"
        );
    }
    comparison
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{condor, contract, scenario_snapshot};
    use crate::analysis::Sentiment;
    use crate::domain::{Leg, OptionType, Volatility};

    fn bull_call() -> Strategy {
        Strategy::from_legs(
            StrategyKind::CallSpread,
            vec![
                Leg::long(contract(OptionType::Call, 150.0, 3.0)),
                Leg::short(contract(OptionType::Call, 155.0, 1.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_condor_scenario_report() {
        let report = analyze(&condor(), &scenario_snapshot(), &AnalysisParams::default()).unwrap();
        assert_eq!(report.kind, StrategyKind::IronCondor);
        assert!((report.net_premium - 200.0).abs() < 1e-9);
        assert!((report.max_profit.finite().unwrap() - 200.0).abs() < 1e-9);
        assert!((report.max_loss.finite().unwrap() - 300.0).abs() < 1e-9);
        assert_eq!(report.breakevens.len(), 2);
        assert!((report.breakevens[0] - 143.0).abs() < 1e-9);
        assert!((report.breakevens[1] - 157.0).abs() < 1e-9);
        assert!((report.time_to_expiry - 30.0 / 365.0).abs() < 1e-12);
        assert!(report.pop > 0.0 && report.pop < 1.0);
        assert!((report.risk_reward_ratio.unwrap() - 200.0 / 300.0).abs() < 1e-9);
        assert_eq!(report.pnl_curve.len(), 50);
        assert_eq!(report.ev_paths, 10_000);
        assert!((report.ev - report.analytic_ev).abs() < 4.0 * report.ev_std_error + 1e-9);
    }

    #[test]
    fn test_seeded_ev_reproducible() {
        let params = AnalysisParams::default();
        let a = analyze(&condor(), &scenario_snapshot(), &params).unwrap();
        let b = analyze(&condor(), &scenario_snapshot(), &params).unwrap();
        assert_eq!(a.ev, b.ev);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pricing_error_surfaces() {
        let snap = MarketSnapshot::new(
            "SPY",
            150.0,
            scenario_snapshot().timestamp(),
            0.05,
            Volatility::Flat(-0.1),
        );
        assert!(matches!(
            analyze(&condor(), &snap, &AnalysisParams::default()),
            Err(PricingError::InvalidVolatility { .. })
        ));
    }

    #[test]
    fn test_compare_ranks_and_reports_failures() {
        let snap = scenario_snapshot();
        let params = AnalysisParams {
            paths: 2_000,
            ..AnalysisParams::default()
        };
        let comparison = compare_strategies(&[condor(), bull_call()], &snap, &params);
        assert_eq!(comparison.ranked.len(), 2);
        assert!(comparison.failures.is_empty());
        assert!(comparison.ranked[0].ev >= comparison.ranked[1].ev);

        let bad = MarketSnapshot::flat("SPY", 0.0, snap.timestamp(), 0.05, 0.25);
        let comparison = compare_strategies(&[condor()], &bad, &params);
        assert!(comparison.ranked.is_empty());
        assert_eq!(comparison.failures.len(), 1);
        assert_eq!(comparison.failures[0].index, 0);
        assert_eq!(comparison.market, None);
    }

    #[test]
    fn test_comparison_market_conditions() {
        let params = AnalysisParams {
            paths: 2_000,
            ..AnalysisParams::default()
        };
        let comparison = compare_strategies(&[condor(), bull_call()], &scenario_snapshot(), &params);
        let market = comparison.market.unwrap();
        assert_eq!(market.strategy_count, 2);

        let total_ev: f64 = comparison.ranked.iter().map(|r| r.ev).sum();
        let average_pop = comparison.ranked.iter().map(|r| r.pop).sum::<f64>() / 2.0;
        assert!((market.total_ev - total_ev).abs() < 1e-9);
        assert!((market.average_pop - average_pop).abs() < 1e-12);
        assert_eq!(market.sentiment, Sentiment::classify(total_ev, average_pop));
    }

    #[test]
    fn test_skewed_smile_moves_value_not_pop() {
        use crate::domain::{SmilePoint, VolSmile};

        let snap = scenario_snapshot();
        let flat = analyze(&condor(), &snap, &AnalysisParams::default()).unwrap();
        // same ATM vol, steep put skew
        let smile = VolSmile::new(vec![
            SmilePoint {
                strike: 140.0,
                volatility: 0.45,
            },
            SmilePoint {
                strike: 150.0,
                volatility: 0.25,
            },
            SmilePoint {
                strike: 160.0,
                volatility: 0.25,
            },
        ]);
        let skewed_snap = MarketSnapshot::new("SPY", 150.0, snap.timestamp(), 0.05, Volatility::Smile(smile));
        let skewed = analyze(&condor(), &skewed_snap, &AnalysisParams::default()).unwrap();

        assert_eq!(flat.pop, skewed.pop);
        assert_eq!(flat.ev, skewed.ev);
        assert!((flat.theoretical_value - skewed.theoretical_value).abs() > 1e-6);
    }
}
