//! Analysis output types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::payoff::{Bound, PnlPoint};
use crate::domain::StrategyKind;
use crate::pricing::Greeks;

/// Trade recommendation derived from EV, risk/reward and POP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    /// Positive EV, RR > 1.5, POP > 60%.
    StrongBuy,
    /// Positive EV, RR > 1.0, POP > 50%.
    Buy,
    /// Positive EV only.
    WeakBuy,
    /// Neither attractive nor clearly bad.
    Hold,
    /// EV worse than half the max loss.
    Avoid,
}

impl Recommendation {
    /// Grade a strategy.
    ///
    /// A missing risk/reward ratio never qualifies for the RR thresholds, and an
    /// unbounded max loss never triggers `Avoid`.
    #[must_use]
    pub fn grade(ev: f64, risk_reward: Option<f64>, pop: f64, max_loss: Bound) -> Self {
        let rr = risk_reward.unwrap_or(0.0);
        if ev > 0.0 {
            if rr > 1.5 && pop > 0.6 {
                return Self::StrongBuy;
            }
            if rr > 1.0 && pop > 0.5 {
                return Self::Buy;
            }
            return Self::WeakBuy;
        }
        match max_loss {
            Bound::Finite(loss) if ev < -0.5 * loss => Self::Avoid,
            _ => Self::Hold,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "STRONG_BUY"),
            Self::Buy => write!(f, "BUY"),
            Self::WeakBuy => write!(f, "WEAK_BUY"),
            Self::Hold => write!(f, "HOLD"),
            Self::Avoid => write!(f, "AVOID"),
        }
    }
}

/// Aggregate read of a batch of strategies on one underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    /// Positive total EV and average POP above 60%.
    Bullish,
    /// Negative total EV and average POP below 40%.
    Bearish,
    /// Anything else.
    Neutral,
}

impl Sentiment {
    /// Classify a batch by its total EV and average POP.
    #[must_use]
    pub fn classify(total_ev: f64, average_pop: f64) -> Self {
        if total_ev > 0.0 && average_pop > 0.6 {
            Self::Bullish
        } else if total_ev < 0.0 && average_pop < 0.4 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Batch totals over analyzed strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Sum of per-unit EV.
    pub total_ev: f64,
    /// Mean POP.
    pub average_pop: f64,
    /// Classification of the two figures above.
    pub sentiment: Sentiment,
    /// Reports aggregated.
    pub strategy_count: usize,
}

impl MarketConditions {
    /// Aggregate reports; `None` for an empty batch.
    #[must_use]
    pub fn from_reports(reports: &[AnalysisReport]) -> Option<Self> {
        if reports.is_empty() {
            return None;
        }
        let total_ev: f64 = reports.iter().map(|r| r.ev).sum();
        let average_pop = reports.iter().map(|r| r.pop).sum::<f64>() / reports.len() as f64;
        Some(Self {
            total_ev,
            average_pop,
            sentiment: Sentiment::classify(total_ev, average_pop),
            strategy_count: reports.len(),
        })
    }
}

/// Full static analysis of one strategy unit against one snapshot.
///
/// Money amounts are per strategy unit with the contract multiplier applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Strategy kind.
    pub kind: StrategyKind,
    /// Underlying symbol.
    pub symbol: String,
    /// Underlying price at analysis.
    pub spot: f64,
    /// Years to expiration (ACT/365).
    pub time_to_expiry: f64,
    /// Premium received (positive) or paid (negative).
    pub net_premium: f64,
    /// Model liquidation value at the snapshot.
    pub theoretical_value: f64,
    /// Largest payoff at expiration.
    pub max_profit: Bound,
    /// Largest loss at expiration, as a positive magnitude.
    pub max_loss: Bound,
    /// Terminal prices where the payoff is zero, ascending.
    pub breakevens: Vec<f64>,
    /// Probability of a strictly positive payoff.
    pub pop: f64,
    /// Monte Carlo expected payoff.
    pub ev: f64,
    /// Standard error of `ev`.
    pub ev_std_error: f64,
    /// Paths behind `ev`.
    pub ev_paths: u32,
    /// Closed-form expected payoff.
    pub analytic_ev: f64,
    /// Direction- and quantity-weighted Greeks, per share.
    pub greeks: Greeks,
    /// Max profit over max loss when both are finite and the loss is positive.
    pub risk_reward_ratio: Option<f64>,
    /// Grade from EV, RR and POP.
    pub recommendation: Recommendation,
    /// Payoff sampled around spot.
    pub pnl_curve: Vec<PnlPoint>,
    /// Mean implied volatility quoted on the legs.
    pub entry_iv: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(50.0, Some(2.0), 0.7, Recommendation::StrongBuy ; "strong buy")]
    #[test_case(50.0, Some(1.2), 0.55, Recommendation::Buy ; "buy")]
    #[test_case(50.0, Some(2.0), 0.4, Recommendation::WeakBuy ; "low pop")]
    #[test_case(50.0, None, 0.9, Recommendation::WeakBuy ; "no ratio")]
    #[test_case(-10.0, Some(2.0), 0.9, Recommendation::Hold ; "small negative")]
    #[test_case(-200.0, Some(0.5), 0.2, Recommendation::Avoid ; "deep negative")]
    fn test_grade(ev: f64, rr: Option<f64>, pop: f64, expected: Recommendation) {
        assert_eq!(Recommendation::grade(ev, rr, pop, Bound::Finite(300.0)), expected);
    }

    #[test]
    fn test_unbounded_loss_never_avoid() {
        assert_eq!(
            Recommendation::grade(-1_000.0, None, 0.1, Bound::Unbounded),
            Recommendation::Hold
        );
    }

    #[test_case(120.0, 0.65, Sentiment::Bullish ; "bullish")]
    #[test_case(120.0, 0.6, Sentiment::Neutral ; "pop at threshold")]
    #[test_case(-80.0, 0.35, Sentiment::Bearish ; "bearish")]
    #[test_case(-80.0, 0.5, Sentiment::Neutral ; "negative ev middling pop")]
    #[test_case(0.0, 0.9, Sentiment::Neutral ; "zero ev")]
    fn test_sentiment(total_ev: f64, average_pop: f64, expected: Sentiment) {
        assert_eq!(Sentiment::classify(total_ev, average_pop), expected);
    }

    #[test]
    fn test_market_conditions_empty() {
        assert_eq!(MarketConditions::from_reports(&[]), None);
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&Recommendation::StrongBuy).unwrap();
        assert_eq!(json, "\"STRONG_BUY\"");
        assert_eq!(Recommendation::WeakBuy.to_string(), "WEAK_BUY");
        assert_eq!(serde_json::to_string(&Sentiment::Bearish).unwrap(), "\"BEARISH\"");
    }
}
