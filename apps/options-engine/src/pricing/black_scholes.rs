//! European Black-Scholes pricing and Greeks.
//!
//! Pure functions of their inputs; safe to call from any thread.
//!
//! At or past expiration (T ≤ 0) an option settles at intrinsic value with every
//! Greek zero except delta, which is 1/0 for calls and -1/0 for puts depending on
//! whether the option finished in the money.

// Black-Scholes uses standard mathematical notation (s, k, t, r, sigma)
// Financial formulas use standard notation where mul_add() obscures meaning
#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

use serde::{Deserialize, Serialize};

use super::error::PricingError;
use super::greeks::Greeks;
use super::{norm_cdf, norm_pdf};
use crate::domain::{Leg, MarketSnapshot, OptionContract, OptionType, Strategy};

const DAYS_PER_YEAR: f64 = 365.0;

/// Raw Black-Scholes inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsInputs {
    /// Call or put.
    pub option_type: OptionType,
    /// Underlying price.
    pub spot: f64,
    /// Strike price.
    pub strike: f64,
    /// Time to expiration in years.
    pub time: f64,
    /// Continuously compounded risk-free rate.
    pub rate: f64,
    /// Annualized volatility.
    pub volatility: f64,
}

impl BsInputs {
    fn validate(&self) -> Result<(), PricingError> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(PricingError::InvalidUnderlying { price: self.spot });
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::InvalidStrike {
                strike: self.strike,
            });
        }
        if !self.volatility.is_finite() || self.volatility <= 0.0 {
            return Err(PricingError::InvalidVolatility {
                strike: self.strike,
                volatility: self.volatility,
            });
        }
        if !self.rate.is_finite() || !self.time.is_finite() {
            return Err(PricingError::InvalidInput {
                message: format!("rate {} and time {} must be finite", self.rate, self.time),
            });
        }
        Ok(())
    }
}

/// Theoretical price and Greeks for one contract, per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Model price.
    pub theoretical_price: f64,
    /// Sensitivities.
    pub greeks: Greeks,
}

/// Black-Scholes d1 and d2.
pub(crate) fn d1_d2(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> (f64, f64) {
    let sqrt_t = t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * sqrt_t);
    (d1, d1 - sigma * sqrt_t)
}

/// Black-Scholes price without validation; `t` must be positive.
pub(crate) fn bs_price(option_type: OptionType, s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    let (d1, d2) = d1_d2(s, k, t, r, sigma);
    let df = (-r * t).exp();
    match option_type {
        OptionType::Call => s * norm_cdf(d1) - k * df * norm_cdf(d2),
        OptionType::Put => k * df * norm_cdf(-d2) - s * norm_cdf(-d1),
    }
}

/// Raw vega (per unit of volatility) without validation.
pub(crate) fn bs_vega(s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    let (d1, _) = d1_d2(s, k, t, r, sigma);
    s * norm_pdf(d1) * t.sqrt()
}

fn settle(option_type: OptionType, s: f64, k: f64) -> OptionQuote {
    let delta = match option_type {
        OptionType::Call if s > k => 1.0,
        OptionType::Put if s < k => -1.0,
        _ => 0.0,
    };
    OptionQuote {
        theoretical_price: option_type.intrinsic(s, k),
        greeks: Greeks {
            delta,
            ..Greeks::zero()
        },
    }
}

/// Price and Greeks from raw inputs.
///
/// # Errors
///
/// Returns a `PricingError` if the underlying, strike or volatility is not positive,
/// or if rate or time is not finite.
pub fn black_scholes(inputs: &BsInputs) -> Result<OptionQuote, PricingError> {
    inputs.validate()?;

    let BsInputs {
        option_type,
        spot: s,
        strike: k,
        time: t,
        rate: r,
        volatility: sigma,
    } = *inputs;

    if t <= 0.0 {
        return Ok(settle(option_type, s, k));
    }

    let sqrt_t = t.sqrt();
    let (d1, d2) = d1_d2(s, k, t, r, sigma);
    let df = (-r * t).exp();
    let pdf_d1 = norm_pdf(d1);

    let gamma = pdf_d1 / (s * sigma * sqrt_t);
    let vega = s * pdf_d1 * sqrt_t / 100.0;
    let decay = -s * pdf_d1 * sigma / (2.0 * sqrt_t);

    let (price, delta, theta, rho) = match option_type {
        OptionType::Call => (
            s * norm_cdf(d1) - k * df * norm_cdf(d2),
            norm_cdf(d1),
            (decay - r * k * df * norm_cdf(d2)) / DAYS_PER_YEAR,
            k * t * df * norm_cdf(d2) / 100.0,
        ),
        OptionType::Put => (
            k * df * norm_cdf(-d2) - s * norm_cdf(-d1),
            norm_cdf(d1) - 1.0,
            (decay + r * k * df * norm_cdf(-d2)) / DAYS_PER_YEAR,
            -k * t * df * norm_cdf(-d2) / 100.0,
        ),
    };

    Ok(OptionQuote {
        theoretical_price: price,
        greeks: Greeks {
            delta,
            gamma,
            theta,
            vega,
            rho,
        },
    })
}

/// Price a contract against a snapshot.
///
/// Time to expiration is ACT/365 from the snapshot timestamp; volatility is read
/// from the snapshot surface at the contract strike.
///
/// # Errors
///
/// Returns a `PricingError` for a non-positive underlying price or volatility.
pub fn price(contract: &OptionContract, snapshot: &MarketSnapshot) -> Result<OptionQuote, PricingError> {
    black_scholes(&BsInputs {
        option_type: contract.option_type(),
        spot: snapshot.price(),
        strike: contract.strike(),
        time: contract.years_to_expiry(snapshot.timestamp()),
        rate: snapshot.risk_free_rate(),
        volatility: snapshot.volatility_at(contract.strike()),
    })
}

/// Per-leg quotes and signed totals for one strategy unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyQuote {
    /// Quotes in leg order.
    pub legs: Vec<OptionQuote>,
    /// Liquidation value of one unit, multiplier applied (negative when net short).
    pub net_value: f64,
    /// Greeks weighted by direction and quantity, per share.
    pub greeks: Greeks,
}

/// Price every leg of a strategy.
///
/// # Errors
///
/// Returns the first leg's `PricingError`; no partial result is produced.
pub fn price_strategy(
    strategy: &Strategy,
    snapshot: &MarketSnapshot,
) -> Result<StrategyQuote, PricingError> {
    let legs = strategy
        .legs()
        .iter()
        .map(|leg| price(leg.contract(), snapshot))
        .collect::<Result<Vec<_>, _>>()?;

    let net_value = strategy
        .legs()
        .iter()
        .zip(&legs)
        .map(|(leg, quote)| leg.value_at_price(quote.theoretical_price))
        .sum();

    let greeks = strategy
        .legs()
        .iter()
        .zip(&legs)
        .map(|(leg, quote)| quote.greeks.scale(Leg::signed_quantity(leg)))
        .sum();

    Ok(StrategyQuote {
        legs,
        net_value,
        greeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{condor, scenario_snapshot};
    use proptest::prelude::*;
    use test_case::test_case;

    fn inputs(option_type: OptionType, spot: f64, strike: f64, time: f64) -> BsInputs {
        BsInputs {
            option_type,
            spot,
            strike,
            time,
            rate: 0.05,
            volatility: 0.2,
        }
    }

    #[test]
    fn test_reference_values() {
        // Hull: S=100, K=100, T=1, r=5%, sigma=20% -> C=10.4506, P=5.5735
        let call = black_scholes(&inputs(OptionType::Call, 100.0, 100.0, 1.0)).unwrap();
        let put = black_scholes(&inputs(OptionType::Put, 100.0, 100.0, 1.0)).unwrap();
        assert!((call.theoretical_price - 10.4506).abs() < 1e-4);
        assert!((put.theoretical_price - 5.5735).abs() < 1e-4);
        assert!((call.greeks.delta - 0.6368).abs() < 1e-4);
        assert!((put.greeks.delta + 0.3632).abs() < 1e-4);
        assert!((call.greeks.gamma - 0.018_762).abs() < 1e-5);
        assert!((call.greeks.vega - 0.375_240).abs() < 1e-5);
    }

    #[test]
    fn test_put_call_parity_scenario() {
        let snap = scenario_snapshot();
        let t = 30.0 / 365.0;
        for k in [140.0, 145.0, 150.0, 155.0, 160.0] {
            let c = black_scholes(&BsInputs {
                option_type: OptionType::Call,
                spot: snap.price(),
                strike: k,
                time: t,
                rate: 0.05,
                volatility: 0.25,
            })
            .unwrap();
            let p = black_scholes(&BsInputs {
                option_type: OptionType::Put,
                spot: snap.price(),
                strike: k,
                time: t,
                rate: 0.05,
                volatility: 0.25,
            })
            .unwrap();
            let parity = snap.price() - k * (-0.05 * t).exp();
            assert!((c.theoretical_price - p.theoretical_price - parity).abs() < 1e-6);
        }
    }

    proptest! {
        #[test]
        fn prop_put_call_parity(
            spot in 10.0f64..500.0,
            moneyness in 0.5f64..1.5,
            time in 0.01f64..3.0,
            rate in 0.0f64..0.1,
            vol in 0.05f64..1.0,
        ) {
            let strike = spot * moneyness;
            let base = BsInputs { option_type: OptionType::Call, spot, strike, time, rate, volatility: vol };
            let c = black_scholes(&base).unwrap().theoretical_price;
            let p = black_scholes(&BsInputs { option_type: OptionType::Put, ..base }).unwrap().theoretical_price;
            prop_assert!((c - p - (spot - strike * (-rate * time).exp())).abs() < 1e-6);
        }

        #[test]
        fn prop_price_bounds(spot in 10.0f64..500.0, moneyness in 0.5f64..1.5, time in 0.01f64..2.0) {
            let strike = spot * moneyness;
            let c = black_scholes(&inputs(OptionType::Call, spot, strike, time)).unwrap();
            prop_assert!(c.theoretical_price >= (spot - strike).max(0.0) - 1e-9);
            prop_assert!(c.theoretical_price <= spot);
            prop_assert!((0.0..=1.0).contains(&c.greeks.delta));
            prop_assert!(c.greeks.gamma >= 0.0);
        }
    }

    #[test_case(OptionType::Call, 110.0, 10.0, 1.0 ; "itm call")]
    #[test_case(OptionType::Call, 90.0, 0.0, 0.0 ; "otm call")]
    #[test_case(OptionType::Call, 100.0, 0.0, 0.0 ; "atm call")]
    #[test_case(OptionType::Put, 90.0, 10.0, -1.0 ; "itm put")]
    #[test_case(OptionType::Put, 110.0, 0.0, 0.0 ; "otm put")]
    fn test_expired_settles_at_intrinsic(kind: OptionType, spot: f64, price: f64, delta: f64) {
        for t in [0.0, -0.5] {
            let q = black_scholes(&inputs(kind, spot, 100.0, t)).unwrap();
            assert_eq!(q.theoretical_price, price);
            assert_eq!(q.greeks.delta, delta);
            assert_eq!(q.greeks.gamma, 0.0);
            assert_eq!(q.greeks.theta, 0.0);
            assert_eq!(q.greeks.vega, 0.0);
            assert_eq!(q.greeks.rho, 0.0);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let mut bad = inputs(OptionType::Call, 100.0, 100.0, 1.0);
        bad.volatility = 0.0;
        assert!(matches!(black_scholes(&bad), Err(PricingError::InvalidVolatility { .. })));
        bad.volatility = -0.2;
        assert!(matches!(black_scholes(&bad), Err(PricingError::InvalidVolatility { .. })));

        let mut bad = inputs(OptionType::Put, 0.0, 100.0, 1.0);
        assert!(matches!(black_scholes(&bad), Err(PricingError::InvalidUnderlying { .. })));
        bad.spot = -1.0;
        assert!(matches!(black_scholes(&bad), Err(PricingError::InvalidUnderlying { .. })));

        let bad = BsInputs {
            rate: f64::NAN,
            ..inputs(OptionType::Put, 100.0, 100.0, 1.0)
        };
        assert!(matches!(black_scholes(&bad), Err(PricingError::InvalidInput { .. })));
    }

    #[test]
    fn test_theta_negative_for_long_atm() {
        let c = black_scholes(&inputs(OptionType::Call, 100.0, 100.0, 0.25)).unwrap();
        assert!(c.greeks.theta < 0.0);
        assert!(c.greeks.rho > 0.0);
    }

    #[test]
    fn test_price_uses_snapshot_time_and_vol() {
        let snap = scenario_snapshot();
        let strategy = condor();
        let leg = &strategy.legs()[1];
        let q = price(leg.contract(), &snap).unwrap();
        let direct = black_scholes(&BsInputs {
            option_type: OptionType::Put,
            spot: 150.0,
            strike: 145.0,
            time: 30.0 / 365.0,
            rate: 0.05,
            volatility: 0.25,
        })
        .unwrap();
        assert!((q.theoretical_price - direct.theoretical_price).abs() < 1e-12);
    }

    #[test]
    fn test_price_strategy_aggregates() {
        let snap = scenario_snapshot();
        let strategy = condor();
        let quote = price_strategy(&strategy, &snap).unwrap();
        assert_eq!(quote.legs.len(), 4);
        // short condor: liability while open, delta near flat, positive theta
        assert!(quote.net_value < 0.0);
        assert!(quote.greeks.delta.abs() < 0.1);
        assert!(quote.greeks.theta > 0.0);
        assert!(quote.greeks.vega < 0.0);
    }

    #[test]
    fn test_price_strategy_error_propagates() {
        let snap = MarketSnapshot::flat("SPY", 150.0, scenario_snapshot().timestamp(), 0.05, 0.0);
        assert!(price_strategy(&condor(), &snap).is_err());
    }
}
