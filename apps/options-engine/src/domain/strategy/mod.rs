//! Multi-leg option strategies.
//!
//! `Strategy` is a sum type over the supported structures. Each variant owns its
//! legs in a fixed canonical order and can only be built through the leg-template
//! validators in [`validation`], so every value in circulation is structurally sound.
//! Deserialization runs the same validators.
//!
//! # Leg Templates
//!
//! | Kind | Legs | Constraint |
//! |------|------|------------|
//! | Iron Condor | 4 | long put < short put < short call < long call |
//! | Straddle | 2 | call and put, same strike and direction |
//! | Strangle | 2 | call and put, same direction, put strike < call strike |
//! | Call/Put Spread | 2 | one long, one short, same type, distinct strikes |
//! | Butterfly | 3 | wings q, body 2q opposite direction, low < mid < high |

pub mod validation;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contract::{CONTRACT_MULTIPLIER, OptionType};
use super::errors::ValidationError;
use super::leg::Leg;
use super::snapshot::MarketSnapshot;

// ============================================================================
// Strategy Kind
// ============================================================================

/// Strategy discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    /// Short put spread plus short call spread.
    IronCondor,
    /// Call and put at the same strike.
    Straddle,
    /// Out-of-the-money call and put.
    Strangle,
    /// Vertical call spread.
    CallSpread,
    /// Vertical put spread.
    PutSpread,
    /// Three-strike butterfly.
    Butterfly,
}

impl StrategyKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::IronCondor,
        Self::Straddle,
        Self::Strangle,
        Self::CallSpread,
        Self::PutSpread,
        Self::Butterfly,
    ];

    /// Number of legs the template requires.
    #[must_use]
    pub const fn leg_count(self) -> usize {
        match self {
            Self::IronCondor => 4,
            Self::Butterfly => 3,
            Self::Straddle | Self::Strangle | Self::CallSpread | Self::PutSpread => 2,
        }
    }

    /// Wire name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IronCondor => "IRON_CONDOR",
            Self::Straddle => "STRADDLE",
            Self::Strangle => "STRANGLE",
            Self::CallSpread => "CALL_SPREAD",
            Self::PutSpread => "PUT_SPREAD",
            Self::Butterfly => "BUTTERFLY",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IronCondor => write!(f, "Iron Condor"),
            Self::Straddle => write!(f, "Straddle"),
            Self::Strangle => write!(f, "Strangle"),
            Self::CallSpread => write!(f, "Call Spread"),
            Self::PutSpread => write!(f, "Put Spread"),
            Self::Butterfly => write!(f, "Butterfly"),
        }
    }
}

// ============================================================================
// Variant Payloads
// ============================================================================

/// Iron condor legs: long put, short put, short call, long call.
#[derive(Debug, Clone, PartialEq)]
pub struct IronCondor {
    legs: [Leg; 4],
}

impl IronCondor {
    /// Lower wing.
    #[must_use]
    pub const fn long_put(&self) -> &Leg {
        &self.legs[0]
    }

    /// Short put body.
    #[must_use]
    pub const fn short_put(&self) -> &Leg {
        &self.legs[1]
    }

    /// Short call body.
    #[must_use]
    pub const fn short_call(&self) -> &Leg {
        &self.legs[2]
    }

    /// Upper wing.
    #[must_use]
    pub const fn long_call(&self) -> &Leg {
        &self.legs[3]
    }
}

/// Straddle legs: call, put.
#[derive(Debug, Clone, PartialEq)]
pub struct Straddle {
    legs: [Leg; 2],
}

impl Straddle {
    /// Call leg.
    #[must_use]
    pub const fn call(&self) -> &Leg {
        &self.legs[0]
    }

    /// Put leg.
    #[must_use]
    pub const fn put(&self) -> &Leg {
        &self.legs[1]
    }
}

/// Strangle legs: put (lower strike), call (higher strike).
#[derive(Debug, Clone, PartialEq)]
pub struct Strangle {
    legs: [Leg; 2],
}

impl Strangle {
    /// Put leg.
    #[must_use]
    pub const fn put(&self) -> &Leg {
        &self.legs[0]
    }

    /// Call leg.
    #[must_use]
    pub const fn call(&self) -> &Leg {
        &self.legs[1]
    }
}

/// Vertical spread legs: long, short.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalSpread {
    legs: [Leg; 2],
}

impl VerticalSpread {
    /// Bought leg.
    #[must_use]
    pub const fn long(&self) -> &Leg {
        &self.legs[0]
    }

    /// Sold leg.
    #[must_use]
    pub const fn short(&self) -> &Leg {
        &self.legs[1]
    }

    /// Strike distance between the legs.
    #[must_use]
    pub fn width(&self) -> f64 {
        (self.long().strike() - self.short().strike()).abs()
    }
}

/// Butterfly legs: lower wing, body, upper wing.
#[derive(Debug, Clone, PartialEq)]
pub struct Butterfly {
    legs: [Leg; 3],
}

impl Butterfly {
    /// Lowest strike wing.
    #[must_use]
    pub const fn lower(&self) -> &Leg {
        &self.legs[0]
    }

    /// Middle strike body (twice the wing quantity).
    #[must_use]
    pub const fn body(&self) -> &Leg {
        &self.legs[1]
    }

    /// Highest strike wing.
    #[must_use]
    pub const fn upper(&self) -> &Leg {
        &self.legs[2]
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// A validated multi-leg strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStrategy", into = "RawStrategy")]
pub enum Strategy {
    /// Iron condor.
    IronCondor(IronCondor),
    /// Straddle.
    Straddle(Straddle),
    /// Strangle.
    Strangle(Strangle),
    /// Call spread.
    CallSpread(VerticalSpread),
    /// Put spread.
    PutSpread(VerticalSpread),
    /// Butterfly.
    Butterfly(Butterfly),
}

/// Unvalidated wire form of a strategy: a kind and its legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStrategy {
    /// Requested strategy kind.
    pub kind: StrategyKind,
    /// Legs in any order.
    pub legs: Vec<Leg>,
}

impl TryFrom<RawStrategy> for Strategy {
    type Error = ValidationError;

    fn try_from(raw: RawStrategy) -> Result<Self, Self::Error> {
        Self::from_legs(raw.kind, raw.legs)
    }
}

impl From<Strategy> for RawStrategy {
    fn from(strategy: Strategy) -> Self {
        Self {
            kind: strategy.kind(),
            legs: strategy.legs().to_vec(),
        }
    }
}

impl Strategy {
    /// Build a strategy of `kind` from legs supplied in any order.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the legs do not fit the kind's template.
    pub fn from_legs(kind: StrategyKind, legs: Vec<Leg>) -> Result<Self, ValidationError> {
        validation::validate_common(kind, &legs)?;
        match kind {
            StrategyKind::IronCondor => validation::iron_condor(legs).map(Self::IronCondor),
            StrategyKind::Straddle => validation::straddle(legs).map(Self::Straddle),
            StrategyKind::Strangle => validation::strangle(legs).map(Self::Strangle),
            StrategyKind::CallSpread => {
                validation::vertical(kind, OptionType::Call, legs).map(Self::CallSpread)
            }
            StrategyKind::PutSpread => {
                validation::vertical(kind, OptionType::Put, legs).map(Self::PutSpread)
            }
            StrategyKind::Butterfly => validation::butterfly(legs).map(Self::Butterfly),
        }
    }

    /// Iron condor from its four legs.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the legs do not form an iron condor.
    pub fn iron_condor(
        long_put: Leg,
        short_put: Leg,
        short_call: Leg,
        long_call: Leg,
    ) -> Result<Self, ValidationError> {
        Self::from_legs(
            StrategyKind::IronCondor,
            vec![long_put, short_put, short_call, long_call],
        )
    }

    /// Strategy kind.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::IronCondor(_) => StrategyKind::IronCondor,
            Self::Straddle(_) => StrategyKind::Straddle,
            Self::Strangle(_) => StrategyKind::Strangle,
            Self::CallSpread(_) => StrategyKind::CallSpread,
            Self::PutSpread(_) => StrategyKind::PutSpread,
            Self::Butterfly(_) => StrategyKind::Butterfly,
        }
    }

    /// Legs in canonical order.
    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        match self {
            Self::IronCondor(s) => &s.legs,
            Self::Straddle(s) => &s.legs,
            Self::Strangle(s) => &s.legs,
            Self::CallSpread(s) | Self::PutSpread(s) => &s.legs,
            Self::Butterfly(s) => &s.legs,
        }
    }

    fn first_leg(&self) -> &Leg {
        &self.legs()[0]
    }

    /// Underlying symbol shared by all legs.
    #[must_use]
    pub fn symbol(&self) -> &str {
        self.first_leg().contract().symbol()
    }

    /// Expiration shared by all legs.
    #[must_use]
    pub fn expiration(&self) -> NaiveDate {
        self.first_leg().contract().expiration()
    }

    /// Distinct strikes, ascending.
    #[must_use]
    pub fn strikes(&self) -> Vec<f64> {
        let mut strikes: Vec<f64> = self.legs().iter().map(Leg::strike).collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();
        strikes
    }

    /// Cash paid to open one unit (negative for a net credit).
    #[must_use]
    pub fn entry_cost(&self) -> f64 {
        self.legs().iter().map(Leg::entry_cost).sum()
    }

    /// Net premium received per unit (positive for a credit).
    #[must_use]
    pub fn net_credit(&self) -> f64 {
        -self.entry_cost()
    }

    /// P&L of one unit at expiration for a terminal underlying price.
    #[must_use]
    pub fn payoff(&self, spot: f64) -> f64 {
        self.legs().iter().map(|leg| leg.payoff(spot)).sum()
    }

    /// Payoff slope per dollar of underlying above the highest strike.
    #[must_use]
    pub fn upper_slope(&self) -> f64 {
        self.legs()
            .iter()
            .map(|leg| {
                leg.signed_quantity() * CONTRACT_MULTIPLIER * leg.contract().option_type().upper_slope()
            })
            .sum()
    }

    /// Quantity-weighted mean implied volatility of the legs at quote time.
    #[must_use]
    pub fn average_implied_volatility(&self) -> f64 {
        let (weighted, total) = self.legs().iter().fold((0.0, 0.0), |(w, n), leg| {
            let q = f64::from(leg.quantity());
            (w + leg.contract().implied_volatility() * q, n + q)
        });
        if total > 0.0 { weighted / total } else { 0.0 }
    }

    /// Short option contracts per unit, used by the naked margin model.
    #[must_use]
    pub fn short_contracts(&self) -> u32 {
        self.legs()
            .iter()
            .filter(|leg| leg.direction() == super::leg::LegDirection::Short)
            .map(Leg::quantity)
            .sum()
    }

    /// Check the strategy against a live snapshot.
    ///
    /// Verifies the symbol matches, the expiration has not passed, and the
    /// underlying sits where the template requires it.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` describing the first failed check.
    pub fn validate_for(&self, snapshot: &MarketSnapshot) -> Result<(), ValidationError> {
        if self.symbol() != snapshot.symbol() {
            return Err(ValidationError::MixedLegs {
                message: format!(
                    "strategy underlying {} does not match snapshot {}",
                    self.symbol(),
                    snapshot.symbol()
                ),
            });
        }
        if self.expiration() <= snapshot.date() {
            return Err(ValidationError::Expired {
                expiration: self.expiration(),
            });
        }
        validation::underlying_in_range(self, snapshot.price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::OptionContract;
    use crate::domain::fixtures::arb_strategy;
    use crate::domain::leg::LegDirection;
    use proptest::prelude::{prop_assert_eq, proptest};

    fn contract(kind: OptionType, strike: f64, premium: f64) -> OptionContract {
        let exp = NaiveDate::from_ymd_opt(2025, 2, 21).unwrap();
        OptionContract::new("SPY", strike, exp, kind, premium, 0.25).unwrap()
    }

    fn sample_condor() -> Strategy {
        Strategy::iron_condor(
            Leg::long(contract(OptionType::Put, 140.0, 0.60)),
            Leg::short(contract(OptionType::Put, 145.0, 1.60)),
            Leg::short(contract(OptionType::Call, 155.0, 1.50)),
            Leg::long(contract(OptionType::Call, 160.0, 0.50)),
        )
        .unwrap()
    }

    #[test]
    fn test_condor_accessors() {
        let s = sample_condor();
        assert_eq!(s.kind(), StrategyKind::IronCondor);
        assert_eq!(s.legs().len(), 4);
        assert_eq!(s.strikes(), vec![140.0, 145.0, 155.0, 160.0]);
        assert!((s.net_credit() - 200.0).abs() < 1e-9);
        let Strategy::IronCondor(ic) = &s else {
            panic!("expected iron condor");
        };
        assert_eq!(ic.short_put().strike(), 145.0);
        assert_eq!(ic.long_call().direction(), LegDirection::Long);
    }

    #[test]
    fn test_legs_any_order_canonicalized() {
        let shuffled = Strategy::from_legs(
            StrategyKind::IronCondor,
            vec![
                Leg::long(contract(OptionType::Call, 160.0, 0.50)),
                Leg::short(contract(OptionType::Put, 145.0, 1.60)),
                Leg::long(contract(OptionType::Put, 140.0, 0.60)),
                Leg::short(contract(OptionType::Call, 155.0, 1.50)),
            ],
        )
        .unwrap();
        assert_eq!(shuffled, sample_condor());
    }

    #[test]
    fn test_condor_payoff_flat_outside_wings() {
        let s = sample_condor();
        assert!((s.payoff(100.0) - s.payoff(140.0)).abs() < 1e-9);
        assert!((s.payoff(200.0) - s.payoff(160.0)).abs() < 1e-9);
        assert_eq!(s.upper_slope(), 0.0);
    }

    #[test]
    fn test_kind_display_and_serde() {
        assert_eq!(StrategyKind::CallSpread.to_string(), "Call Spread");
        let json = serde_json::to_string(&StrategyKind::IronCondor).unwrap();
        assert_eq!(json, "\"IRON_CONDOR\"");
    }

    #[test]
    fn test_serde_roundtrip_exact() {
        let s = sample_condor();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"kind\":\"IRON_CONDOR\""));
        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn test_deserialize_invalid_template_rejected() {
        let mut raw = RawStrategy::from(sample_condor());
        raw.legs.pop();
        let json = serde_json::to_string(&raw).unwrap();
        let Err(err) = serde_json::from_str::<Strategy>(&json) else {
            panic!("three-leg condor must not deserialize");
        };
        assert!(err.to_string().contains("requires 4 legs"));
    }

    #[test]
    fn test_average_iv_and_shorts() {
        let s = sample_condor();
        assert!((s.average_implied_volatility() - 0.25).abs() < 1e-12);
        assert_eq!(s.short_contracts(), 2);
    }

    proptest! {
        #[test]
        fn prop_serde_roundtrip_all_kinds(s in arb_strategy()) {
            let json = serde_json::to_string(&s).unwrap();
            let back: Strategy = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back.kind(), s.kind());
            prop_assert_eq!(back.legs(), s.legs());
            prop_assert_eq!(back, s);
        }
    }
}
