//! Rule-based selector that lays out fixed strategy templates around spot.
//!
//! Kinds are taken in rotation from the configuration. Strikes snap to the
//! listed chain when one is supplied, otherwise to the configured increment.
//! Premiums come from chain quotes when listed and from Black-Scholes
//! otherwise; missing implied volatilities are solved from the premium.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::application::ports::{SelectorError, StrategySelectorPort};
use crate::config::SelectorConfig;
use crate::domain::{
    Leg, LegDirection, MarketSnapshot, OptionChain, OptionContract, OptionType, RiskLevel,
    StrategyKind, StrategyProposal, ValidationError, years_between,
};
use crate::pricing::{IvQuery, IvSolver, PricingError, price};

#[derive(Debug, thiserror::Error)]
enum TemplateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Built-in strategy selector.
#[derive(Debug)]
pub struct TemplateSelector {
    config: SelectorConfig,
    solver: IvSolver,
    cursor: AtomicUsize,
}

impl TemplateSelector {
    /// Selector over `config`.
    #[must_use]
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            solver: IvSolver::default(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Selector settings.
    #[must_use]
    pub const fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Restart the rotation at the first configured kind.
    pub fn reset(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// Propose the next kind in rotation.
    ///
    /// Returns `None` when no kinds are configured or the template cannot be laid
    /// out around the current price (for example, strikes collapsing onto one
    /// listed strike).
    pub fn select(&self, snapshot: &MarketSnapshot, chain: Option<&OptionChain>) -> Option<StrategyProposal> {
        if self.config.kinds.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.config.kinds.len();
        let kind = self.config.kinds[index];

        match self.build(kind, snapshot, chain) {
            Ok(proposal) => Some(proposal),
            Err(e) => {
                debug!(strategy = kind.as_str(), spot = snapshot.price(), error = %e, "Template not applicable");
                None
            }
        }
    }

    fn build(
        &self,
        kind: StrategyKind,
        snapshot: &MarketSnapshot,
        chain: Option<&OptionChain>,
    ) -> Result<StrategyProposal, TemplateError> {
        let spot = snapshot.price();
        let today = snapshot.date();
        let days = match kind {
            StrategyKind::Straddle | StrategyKind::Strangle => self.config.long_vol_days_to_expiry,
            _ => self.config.days_to_expiry,
        };
        let expiration = chain
            .and_then(|c| c.expiration_after(today, days))
            .unwrap_or_else(|| today + Duration::days(days));
        let layout = Layout {
            selector: self,
            snapshot,
            chain,
            expiration,
        };
        let w = self.config.wing_offset;

        use LegDirection::{Long, Short};
        use OptionType::{Call, Put};
        let legs = match kind {
            StrategyKind::IronCondor => {
                let [lp, sp, sc, lc] = self.config.condor_offsets;
                vec![
                    layout.leg(Put, spot * lp, Long, 1)?,
                    layout.leg(Put, spot * sp, Short, 1)?,
                    layout.leg(Call, spot * sc, Short, 1)?,
                    layout.leg(Call, spot * lc, Long, 1)?,
                ]
            }
            StrategyKind::Straddle => vec![
                layout.leg(Call, spot, Long, 1)?,
                layout.leg(Put, spot, Long, 1)?,
            ],
            StrategyKind::Strangle => vec![
                layout.leg(Put, spot * (1.0 - w), Long, 1)?,
                layout.leg(Call, spot * (1.0 + w), Long, 1)?,
            ],
            StrategyKind::CallSpread => vec![
                layout.leg(Call, spot, Long, 1)?,
                layout.leg(Call, spot * (1.0 + w), Short, 1)?,
            ],
            StrategyKind::PutSpread => vec![
                layout.leg(Put, spot, Long, 1)?,
                layout.leg(Put, spot * (1.0 - w), Short, 1)?,
            ],
            StrategyKind::Butterfly => vec![
                layout.leg(Call, spot * (1.0 - w), Long, 1)?,
                layout.leg(Call, spot, Short, 2)?,
                layout.leg(Call, spot * (1.0 + w), Long, 1)?,
            ],
        };

        let proposal = StrategyProposal {
            kind,
            legs,
            rationale: format!(
                "{kind} around {spot:.2}, expiring {expiration}, ATM vol {:.1}%",
                snapshot.atm_volatility() * 100.0
            ),
            confidence: self.config.confidence,
            risk_level: risk_level(kind),
        };
        // Reject layouts that do not form the template before handing them out.
        proposal.clone().into_strategy()?;
        Ok(proposal)
    }

    fn round_strike(&self, target: f64) -> f64 {
        let increment = self.config.strike_increment;
        if increment > 0.0 {
            ((target / increment).round() * increment).max(increment)
        } else {
            target
        }
    }
}

const fn risk_level(kind: StrategyKind) -> RiskLevel {
    match kind {
        StrategyKind::IronCondor | StrategyKind::Butterfly => RiskLevel::Low,
        StrategyKind::CallSpread | StrategyKind::PutSpread => RiskLevel::Medium,
        StrategyKind::Straddle | StrategyKind::Strangle => RiskLevel::High,
    }
}

struct Layout<'a> {
    selector: &'a TemplateSelector,
    snapshot: &'a MarketSnapshot,
    chain: Option<&'a OptionChain>,
    expiration: NaiveDate,
}

impl Layout<'_> {
    fn strike(&self, target: f64) -> f64 {
        self.chain
            .and_then(|c| c.nearest_strike(self.expiration, target))
            .unwrap_or_else(|| self.selector.round_strike(target))
    }

    fn leg(
        &self,
        option_type: OptionType,
        target: f64,
        direction: LegDirection,
        quantity: u32,
    ) -> Result<Leg, TemplateError> {
        let contract = self.contract(option_type, self.strike(target))?;
        Ok(Leg::new(contract, direction, quantity)?)
    }

    fn contract(&self, option_type: OptionType, strike: f64) -> Result<OptionContract, TemplateError> {
        let symbol = self.snapshot.symbol();
        let surface_vol = self.snapshot.volatility_at(strike);
        let quote = self
            .chain
            .and_then(|c| c.quote(self.expiration, strike, option_type));

        let Some(quote) = quote else {
            let unpriced =
                OptionContract::new(symbol, strike, self.expiration, option_type, 0.0, surface_vol)?;
            let premium = price(&unpriced, self.snapshot)?.theoretical_price.max(0.0);
            return Ok(OptionContract::new(
                symbol,
                strike,
                self.expiration,
                option_type,
                premium,
                surface_vol,
            )?);
        };

        let implied_volatility = quote
            .implied_volatility
            .filter(|v| *v > 0.0)
            .or_else(|| {
                self.selector
                    .solver
                    .solve(&IvQuery {
                        option_type,
                        market_price: quote.premium,
                        spot: self.snapshot.price(),
                        strike,
                        time: years_between(self.snapshot.timestamp(), self.expiration),
                        rate: self.snapshot.risk_free_rate(),
                    })
                    .ok()
            })
            .unwrap_or(surface_vol);

        Ok(OptionContract::new(
            symbol,
            strike,
            self.expiration,
            option_type,
            quote.premium,
            implied_volatility,
        )?)
    }
}

#[async_trait]
impl StrategySelectorPort for TemplateSelector {
    async fn propose(
        &self,
        snapshot: &MarketSnapshot,
        chain: Option<&OptionChain>,
    ) -> Result<Option<StrategyProposal>, SelectorError> {
        Ok(self.select(snapshot, chain))
    }
}
