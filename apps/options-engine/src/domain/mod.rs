//! Domain Layer
//!
//! Immutable value types for contracts, legs, strategies and snapshots, plus the
//! `Position` entity and its lifecycle state machine.
//!
//! # Modules
//!
//! - `contract`: `OptionContract`, `OptionType`, contract multiplier
//! - `leg`: `Leg`, `LegDirection`
//! - `strategy`: `Strategy` sum type and leg-template validators
//! - `snapshot`: `MarketSnapshot`, volatility surfaces
//! - `chain`: `OptionChain` quotes
//! - `position`: `Position`, `PositionState`
//! - `proposal`: `StrategyProposal` from external selectors
//! - `errors`: `ValidationError`, `LifecycleError`

pub mod chain;
pub mod contract;
pub mod errors;
pub mod leg;
pub mod position;
pub mod proposal;
pub mod snapshot;
pub mod strategy;

pub use chain::{ChainQuote, OptionChain};
pub use contract::{CONTRACT_MULTIPLIER, OptionContract, OptionType, years_between};
pub use errors::{LifecycleError, ValidationError};
pub use leg::{Leg, LegDirection};
pub use position::{Position, PositionId, PositionState, RiskProfile};
pub use proposal::{RiskLevel, StrategyProposal};
pub use snapshot::{MarketSnapshot, SmilePoint, VolSmile, Volatility};
pub use strategy::{
    Butterfly, IronCondor, Straddle, Strangle, Strategy, StrategyKind, RawStrategy,
    VerticalSpread,
};

/// Shared test data: the 150 / [140, 145, 155, 160] iron condor scenario.
#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, NaiveDate, Utc};
    use proptest::prelude::{BoxedStrategy, any, prop_oneof};
    use proptest::strategy::Strategy as _;

    use super::{
        Leg, LegDirection, MarketSnapshot, OptionContract, OptionType, SmilePoint, Strategy,
        StrategyKind, VolSmile, Volatility,
    };

    pub fn scenario_time() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 1, 22)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    /// 30 calendar days after `scenario_time`.
    pub fn scenario_expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 21).unwrap()
    }

    pub fn scenario_snapshot() -> MarketSnapshot {
        MarketSnapshot::flat("SPY", 150.0, scenario_time(), 0.05, 0.25)
    }

    pub fn contract(option_type: OptionType, strike: f64, premium: f64) -> OptionContract {
        OptionContract::new("SPY", strike, scenario_expiry(), option_type, premium, 0.25).unwrap()
    }

    /// Net credit 2.00; max profit 200, max loss 300, breakevens 143 and 157.
    pub fn condor() -> Strategy {
        Strategy::iron_condor(
            Leg::long(contract(OptionType::Put, 140.0, 0.60)),
            Leg::short(contract(OptionType::Put, 145.0, 1.60)),
            Leg::short(contract(OptionType::Call, 155.0, 1.50)),
            Leg::long(contract(OptionType::Call, 160.0, 0.50)),
        )
        .unwrap()
    }

    /// Premium and implied volatility of one generated contract.
    type Quote = (f64, f64);

    fn quoted(option_type: OptionType, strike: f64, (premium, iv): Quote) -> OptionContract {
        OptionContract::new("SPY", strike, scenario_expiry(), option_type, premium, iv).unwrap()
    }

    fn leg(option_type: OptionType, strike: f64, quote: Quote, direction: LegDirection, quantity: u32) -> Leg {
        Leg::new(quoted(option_type, strike, quote), direction, quantity).unwrap()
    }

    fn build(
        kind: StrategyKind,
        strikes: [f64; 4],
        quotes: &[Quote],
        quantity: u32,
        (long, calls): (bool, bool),
    ) -> Strategy {
        use LegDirection::{Long, Short};
        use OptionType::{Call, Put};

        let [k0, k1, k2, k3] = strikes;
        let side = if long { Long } else { Short };
        let legs = match kind {
            StrategyKind::IronCondor => vec![
                leg(Put, k0, quotes[0], Long, quantity),
                leg(Put, k1, quotes[1], Short, quantity),
                leg(Call, k2, quotes[2], Short, quantity),
                leg(Call, k3, quotes[3], Long, quantity),
            ],
            StrategyKind::Straddle => vec![
                leg(Call, k1, quotes[0], side, quantity),
                leg(Put, k1, quotes[1], side, quantity),
            ],
            StrategyKind::Strangle => vec![
                leg(Put, k0, quotes[0], side, quantity),
                leg(Call, k2, quotes[1], side, quantity),
            ],
            StrategyKind::CallSpread | StrategyKind::PutSpread => {
                let option_type = if kind == StrategyKind::CallSpread { Call } else { Put };
                let (long_strike, short_strike) = if long { (k1, k2) } else { (k2, k1) };
                vec![
                    leg(option_type, long_strike, quotes[0], Long, quantity),
                    leg(option_type, short_strike, quotes[1], Short, quantity),
                ]
            }
            StrategyKind::Butterfly => {
                let option_type = if calls { Call } else { Put };
                vec![
                    leg(option_type, k0, quotes[0], side, quantity),
                    leg(option_type, k1, quotes[1], side.opposite(), 2 * quantity),
                    leg(option_type, k2, quotes[2], side, quantity),
                ]
            }
        };
        Strategy::from_legs(kind, legs).unwrap()
    }

    /// Valid strategies of every kind with varied strikes, quotes, sides and quantities.
    pub fn arb_strategy() -> BoxedStrategy<Strategy> {
        (
            proptest::sample::select(StrategyKind::ALL.to_vec()),
            20.0f64..400.0,
            proptest::array::uniform3(0.5f64..30.0),
            proptest::collection::vec((0.0f64..25.0, 0.05f64..1.5), 4),
            1u32..20,
            any::<(bool, bool)>(),
        )
            .prop_map(|(kind, base, gaps, quotes, quantity, flags)| {
                let strikes = [
                    base,
                    base + gaps[0],
                    base + gaps[0] + gaps[1],
                    base + gaps[0] + gaps[1] + gaps[2],
                ];
                build(kind, strikes, &quotes, quantity, flags)
            })
            .boxed()
    }

    /// Snapshots with either a flat volatility or a smile of one to six points.
    pub fn arb_snapshot() -> BoxedStrategy<MarketSnapshot> {
        let flat = (0.01f64..2.0).prop_map(Volatility::Flat);
        let smile = proptest::collection::vec((1.0f64..500.0, 0.01f64..2.0), 1..6).prop_map(|points| {
            Volatility::Smile(VolSmile::new(
                points
                    .into_iter()
                    .map(|(strike, volatility)| SmilePoint { strike, volatility })
                    .collect(),
            ))
        });
        (
            1.0f64..500.0,
            0i64..10_000_000,
            -0.02f64..0.10,
            prop_oneof![flat, smile],
        )
            .prop_map(|(price, seconds, rate, volatility)| {
                let timestamp = scenario_time() + chrono::Duration::seconds(seconds);
                MarketSnapshot::new("SPY", price, timestamp, rate, volatility)
            })
            .boxed()
    }
}
