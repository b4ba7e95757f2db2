//! Iron Condor Scenario
//!
//! S=150, strikes 140/145/155/160, T=30/365, r=0.05, σ=0.25, premiums
//! 0.60/1.60/1.50/0.50 (net credit 2.00).

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, NaiveDate, Utc};

use options_engine::analysis::{AnalysisParams, Bound, analyze};
use options_engine::domain::{
    Leg, MarketSnapshot, OptionContract, OptionType, Strategy, StrategyKind, years_between,
};
use options_engine::pricing::{BsInputs, black_scholes};

const SPOT: f64 = 150.0;
const CREDIT: f64 = 2.0;

fn now() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 1, 22)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 21).unwrap()
}

fn snapshot() -> MarketSnapshot {
    MarketSnapshot::flat("SPY", SPOT, now(), 0.05, 0.25)
}

fn contract(option_type: OptionType, strike: f64, premium: f64) -> OptionContract {
    OptionContract::new("SPY", strike, expiry(), option_type, premium, 0.25).unwrap()
}

fn condor() -> Strategy {
    Strategy::iron_condor(
        Leg::long(contract(OptionType::Put, 140.0, 0.60)),
        Leg::short(contract(OptionType::Put, 145.0, 1.60)),
        Leg::short(contract(OptionType::Call, 155.0, 1.50)),
        Leg::long(contract(OptionType::Call, 160.0, 0.50)),
    )
    .unwrap()
}

fn params() -> AnalysisParams {
    AnalysisParams {
        paths: 10_000,
        seed: 42,
        ..AnalysisParams::default()
    }
}

fn finite(bound: Bound) -> f64 {
    match bound {
        Bound::Finite(v) => v,
        Bound::Unbounded => panic!("expected a finite bound"),
    }
}

#[test]
fn time_to_expiry_is_thirty_days() {
    assert!((years_between(now(), expiry()) - 30.0 / 365.0).abs() < 1e-12);
}

#[test]
fn extremes_and_breakevens() {
    let report = analyze(&condor(), &snapshot(), &params()).unwrap();

    assert_eq!(report.kind, StrategyKind::IronCondor);
    assert!((finite(report.max_profit) - CREDIT * 100.0).abs() < 1e-9);
    assert!((finite(report.max_loss) - (5.0 - CREDIT) * 100.0).abs() < 1e-9);

    assert_eq!(report.breakevens.len(), 2);
    assert!((report.breakevens[0] - (145.0 - CREDIT)).abs() < 1e-9);
    assert!((report.breakevens[1] - (155.0 + CREDIT)).abs() < 1e-9);
    for b in &report.breakevens {
        assert!(condor().payoff(*b).abs() < 1e-6);
    }

    assert!(report.pop > 0.0 && report.pop < 1.0);
}

#[test]
fn payoff_is_bounded_and_flat_outside_wings() {
    let strategy = condor();
    let max_profit = CREDIT * 100.0;
    let max_loss = (5.0 - CREDIT) * 100.0;

    let mut spot = 100.0;
    while spot <= 200.0 {
        let payoff = strategy.payoff(spot);
        assert!(payoff <= max_profit + 1e-9, "payoff {payoff} above credit at {spot}");
        assert!(payoff >= -max_loss - 1e-9, "payoff {payoff} below max loss at {spot}");
        spot += 0.25;
    }

    assert!((strategy.payoff(120.0) - strategy.payoff(135.0)).abs() < 1e-9);
    assert!((strategy.payoff(165.0) - strategy.payoff(190.0)).abs() < 1e-9);
    assert!((strategy.payoff(150.0) - max_profit).abs() < 1e-9);
}

#[test]
fn seeded_ev_is_reproducible() {
    let first = analyze(&condor(), &snapshot(), &params()).unwrap();
    let second = analyze(&condor(), &snapshot(), &params()).unwrap();
    assert_eq!(first.ev, second.ev);
    assert_eq!(first.ev_paths, 10_000);

    let other_seed = analyze(
        &condor(),
        &snapshot(),
        &AnalysisParams {
            seed: 7,
            ..params()
        },
    )
    .unwrap();
    assert_ne!(first.ev, other_seed.ev);
}

#[test]
fn put_call_parity_at_each_strike() {
    let time = 30.0 / 365.0;
    for strike in [140.0, 145.0, 150.0, 155.0, 160.0] {
        let inputs = |option_type| BsInputs {
            option_type,
            spot: SPOT,
            strike,
            time,
            rate: 0.05,
            volatility: 0.25,
        };
        let call = black_scholes(&inputs(OptionType::Call)).unwrap().theoretical_price;
        let put = black_scholes(&inputs(OptionType::Put)).unwrap().theoretical_price;
        let forward = SPOT - strike * (-0.05 * time).exp();
        assert!((call - put - forward).abs() < 1e-6, "parity broken at {strike}");
    }
}

#[test]
fn strategy_json_round_trip() {
    let strategy = condor();
    let json = serde_json::to_string(&strategy).unwrap();
    let back: Strategy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, strategy);
}
