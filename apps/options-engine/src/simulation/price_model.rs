//! Underlying price evolution and the trading calendar.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use crate::domain::MarketSnapshot;

/// Trading days per year; one simulated step is `1 / 252` years.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One geometric Brownian motion step.
///
/// `S' = S · exp((r − σ²/2)·dt + σ·√dt·z)`
#[must_use]
pub fn gbm_step(price: f64, rate: f64, volatility: f64, dt: f64, z: f64) -> f64 {
    let drift = (rate - 0.5 * volatility * volatility) * dt;
    let diffusion = volatility * dt.sqrt() * z;
    price * (drift + diffusion).exp()
}

/// Next weekday after `date`.
#[must_use]
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date;
    while let Some(day) = next.succ_opt() {
        next = day;
        if !matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
            break;
        }
    }
    next
}

/// Midnight UTC of `date`, the timestamp of every simulated snapshot.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Seeded GBM generator for the simulated underlying.
#[derive(Debug, Clone)]
pub struct PriceModel {
    seed: u64,
    rng: StdRng,
    dt: f64,
}

impl PriceModel {
    /// Model stepping one trading day at a time.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            dt: 1.0 / TRADING_DAYS_PER_YEAR,
        }
    }

    /// Seed the generator was built with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind to the first draw.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Snapshot for the next business day, evolved from `from` with its
    /// at-the-money volatility. Rate and surface carry over.
    pub fn next_snapshot(&mut self, from: &MarketSnapshot) -> MarketSnapshot {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        let price = gbm_step(
            from.price(),
            from.risk_free_rate(),
            from.atm_volatility(),
            self.dt,
            z,
        );
        let date = next_business_day(from.date());
        from.evolve(price, start_of_day(date))
    }
}
