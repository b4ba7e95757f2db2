//! Market snapshots and volatility surfaces.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// One point of a volatility smile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmilePoint {
    /// Strike price.
    pub strike: f64,
    /// Implied volatility at that strike.
    pub volatility: f64,
}

/// Implied volatility by strike, linearly interpolated and flat beyond the ends.
///
/// Serialized as a bare list of points. Deserialization goes through
/// [`TryFrom`], so unordered input is sorted and bad volatilities are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SmilePoint>", into = "Vec<SmilePoint>")]
pub struct VolSmile {
    points: Vec<SmilePoint>,
}

impl VolSmile {
    /// Build a smile; points are sorted by strike.
    #[must_use]
    pub fn new(mut points: Vec<SmilePoint>) -> Self {
        points.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        Self { points }
    }

    /// Points ordered by strike.
    #[must_use]
    pub fn points(&self) -> &[SmilePoint] {
        &self.points
    }

    /// Volatility at `strike`. An empty smile yields 0.0, which pricing rejects.
    #[must_use]
    pub fn at(&self, strike: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if strike <= first.strike {
            return first.volatility;
        }
        if strike >= last.strike {
            return last.volatility;
        }
        self.points
            .windows(2)
            .find(|w| strike >= w[0].strike && strike <= w[1].strike)
            .map_or(last.volatility, |w| {
                let span = w[1].strike - w[0].strike;
                if span <= 0.0 {
                    return w[0].volatility;
                }
                let t = (strike - w[0].strike) / span;
                w[0].volatility + t * (w[1].volatility - w[0].volatility)
            })
    }
}

impl TryFrom<Vec<SmilePoint>> for VolSmile {
    type Error = ValidationError;

    fn try_from(points: Vec<SmilePoint>) -> Result<Self, Self::Error> {
        if points.is_empty() {
            return Err(ValidationError::InvalidSmile {
                message: "at least one point is required".to_string(),
            });
        }
        let positive = |x: f64| x.is_finite() && x > 0.0;
        if let Some(p) = points.iter().find(|p| !positive(p.strike) || !positive(p.volatility)) {
            return Err(ValidationError::InvalidSmile {
                message: format!(
                    "strike and volatility must be positive, got {} at strike {}",
                    p.volatility, p.strike
                ),
            });
        }
        Ok(Self::new(points))
    }
}

impl From<VolSmile> for Vec<SmilePoint> {
    fn from(smile: VolSmile) -> Self {
        smile.points
    }
}

/// Volatility input of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Volatility {
    /// Single implied volatility for every strike.
    Flat(f64),
    /// Strike-dependent smile.
    Smile(VolSmile),
}

impl Volatility {
    /// Volatility at `strike`.
    #[must_use]
    pub fn at(&self, strike: f64) -> f64 {
        match self {
            Self::Flat(v) => *v,
            Self::Smile(smile) => smile.at(strike),
        }
    }
}

/// Point-in-time market state for one underlying.
///
/// Supplied externally. The engine derives new snapshots rather than mutating one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    symbol: String,
    price: f64,
    timestamp: DateTime<Utc>,
    risk_free_rate: f64,
    volatility: Volatility,
}

impl MarketSnapshot {
    /// Snapshot with a volatility surface.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        price: f64,
        timestamp: DateTime<Utc>,
        risk_free_rate: f64,
        volatility: Volatility,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            risk_free_rate,
            volatility,
        }
    }

    /// Snapshot with a single implied volatility.
    #[must_use]
    pub fn flat(
        symbol: impl Into<String>,
        price: f64,
        timestamp: DateTime<Utc>,
        risk_free_rate: f64,
        implied_volatility: f64,
    ) -> Self {
        Self::new(
            symbol,
            price,
            timestamp,
            risk_free_rate,
            Volatility::Flat(implied_volatility),
        )
    }

    /// Underlying symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Underlying price.
    #[must_use]
    pub const fn price(&self) -> f64 {
        self.price
    }

    /// Observation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Calendar date of the observation.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Annualized risk-free rate.
    #[must_use]
    pub const fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Volatility surface.
    #[must_use]
    pub const fn volatility(&self) -> &Volatility {
        &self.volatility
    }

    /// Implied volatility at `strike`.
    #[must_use]
    pub fn volatility_at(&self, strike: f64) -> f64 {
        self.volatility.at(strike)
    }

    /// At-the-money implied volatility.
    #[must_use]
    pub fn atm_volatility(&self) -> f64 {
        self.volatility.at(self.price)
    }

    /// Derived snapshot at a new price and time; rate and surface carry over.
    #[must_use]
    pub fn evolve(&self, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            price,
            timestamp,
            risk_free_rate: self.risk_free_rate,
            volatility: self.volatility.clone(),
        }
    }
}
