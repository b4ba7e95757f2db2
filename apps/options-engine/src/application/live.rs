//! Live Session
//!
//! Runs the decision loop against external collaborators. A producer task
//! fetches each day's snapshot, chain and proposal concurrently, every call
//! bounded by the feed timeout, and hands a [`DayInput`] to the loop over a
//! bounded queue. The loop owns the engine and applies inputs in the order
//! they were produced, so portfolio mutations follow the calendar no matter
//! when the external calls complete.
//!
//! Failed or timed-out snapshot fetches become degraded days. Failed or
//! timed-out selector calls mean no proposal for that day.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::ports::{EventPublisherPort, MarketDataPort, StrategySelectorPort};
use crate::config::Config;
use crate::domain::{MarketSnapshot, OptionChain};
use crate::error::EngineError;
use crate::simulation::{
    DayInput, DayReport, MarketInput, SimulationEngine, SimulationResult, next_business_day,
};

/// Live session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSettings {
    /// Days to run before stopping.
    pub days: u32,
    /// Per-call timeout for market data and selector requests.
    pub timeout: Duration,
    /// Capacity of the producer to decision-loop queue.
    pub queue_capacity: usize,
}

impl LiveSettings {
    /// Settings from configuration: the simulation horizon and the feed section.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            days: config.simulation.horizon_days,
            timeout: Duration::from_millis(config.feed.timeout_ms),
            queue_capacity: config.feed.queue_capacity,
        }
    }
}

/// What a finished session leaves behind.
#[derive(Debug)]
pub struct LiveOutcome {
    /// The engine, for inspection or a further session.
    pub engine: SimulationEngine,
    /// One report per applied day.
    pub reports: Vec<DayReport>,
    /// Result of the run so far.
    pub result: SimulationResult,
    /// Fatal error that stopped the loop, if any.
    pub error: Option<EngineError>,
}

/// Wires the collaborators to a decision loop.
pub struct LiveSession<M, S, P> {
    market: Arc<M>,
    selector: Arc<S>,
    publisher: Arc<P>,
    settings: LiveSettings,
    shutdown: CancellationToken,
}

impl<M, S, P> LiveSession<M, S, P>
where
    M: MarketDataPort + 'static,
    S: StrategySelectorPort + 'static,
    P: EventPublisherPort,
{
    /// Create a session. Cancelling `shutdown` stops the producer; the loop
    /// drains what was already queued.
    #[must_use]
    pub const fn new(
        market: Arc<M>,
        selector: Arc<S>,
        publisher: Arc<P>,
        settings: LiveSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            market,
            selector,
            publisher,
            settings,
            shutdown,
        }
    }

    /// Run the session to completion, cancellation or a fatal engine error.
    pub async fn run(&self, mut engine: SimulationEngine) -> LiveOutcome {
        let (tx, mut rx) = mpsc::channel(self.settings.queue_capacity.max(1));
        let producer_token = self.shutdown.child_token();
        let producer = Producer {
            market: Arc::clone(&self.market),
            selector: Arc::clone(&self.selector),
            symbol: engine.snapshot().symbol().to_string(),
            last_snapshot: engine.snapshot().clone(),
            last_chain: None,
            date: engine.snapshot().date(),
            day: engine.day(),
            interval: engine.trading_interval().max(1),
            days: self.settings.days,
            timeout: self.settings.timeout,
        };

        info!(
            symbol = %producer.symbol,
            days = self.settings.days,
            timeout_ms = self.settings.timeout.as_millis() as u64,
            "Starting live session"
        );
        let handle = tokio::spawn(producer.run(tx, producer_token.clone()));

        let mut reports = Vec::new();
        let mut failure = None;
        while let Some(input) = rx.recv().await {
            match engine.step(input) {
                Ok(report) => {
                    if !report.events.is_empty()
                        && let Err(e) = self.publisher.publish_events(report.events.clone()).await
                    {
                        warn!(day = report.day, error = %e, "Failed to publish position events");
                    }
                    reports.push(report);
                }
                Err(e) => {
                    error!(code = %e.code(), error = %e, "Decision loop stopped");
                    producer_token.cancel();
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(rx);

        if let Err(e) = handle.await {
            warn!(error = %e, "Feed producer task failed");
        }

        let result = engine.result();
        info!(
            days = result.days,
            degraded_days = result.degraded_days,
            trades = result.final_metrics.total_trades,
            final_value = %result.final_metrics.final_value,
            "Live session finished"
        );
        LiveOutcome {
            engine,
            reports,
            result,
            error: failure,
        }
    }
}

struct Producer<M, S> {
    market: Arc<M>,
    selector: Arc<S>,
    symbol: String,
    last_snapshot: MarketSnapshot,
    last_chain: Option<OptionChain>,
    date: NaiveDate,
    day: u32,
    interval: u32,
    days: u32,
    timeout: Duration,
}

impl<M, S> Producer<M, S>
where
    M: MarketDataPort,
    S: StrategySelectorPort,
{
    async fn run(mut self, tx: mpsc::Sender<DayInput>, shutdown: CancellationToken) {
        for _ in 0..self.days {
            let trading_day = self.day % self.interval == 0;
            self.date = next_business_day(self.date);

            let input = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                input = self.fetch(trading_day) => input,
            };
            self.day += 1;

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                sent = tx.send(input) => {
                    if sent.is_err() {
                        debug!("Decision loop closed; producer stopping");
                        break;
                    }
                }
            }
        }
        debug!(day = self.day, "Feed producer finished");
    }

    /// The selector sees the freshest snapshot and chain the producer holds
    /// while today's are being fetched.
    async fn fetch(&mut self, trading_day: bool) -> DayInput {
        let timeout = self.timeout;
        let date = self.date;
        let market = &*self.market;
        let selector = &*self.selector;
        let symbol = self.symbol.as_str();
        let last_snapshot = &self.last_snapshot;
        let last_chain = self.last_chain.as_ref();

        let data = async {
            tokio::join!(
                time::timeout(timeout, market.snapshot(symbol, date)),
                time::timeout(timeout, market.option_chain(symbol, date)),
            )
        };
        let proposal = async {
            if !trading_day {
                return None;
            }
            match time::timeout(timeout, selector.propose(last_snapshot, last_chain)).await {
                Ok(Ok(proposal)) => proposal,
                Ok(Err(e)) => {
                    warn!(%date, error = %e, "Selector failed; no proposal today");
                    None
                }
                Err(_) => {
                    warn!(%date, timeout_ms = timeout.as_millis() as u64, "Selector timed out; no proposal today");
                    None
                }
            }
        };
        let ((snapshot, chain), proposal) = tokio::join!(data, proposal);

        let market = match snapshot {
            Ok(Ok(snapshot)) => {
                self.last_snapshot = snapshot.clone();
                MarketInput::Observed { snapshot }
            }
            Ok(Err(e)) => MarketInput::Unavailable {
                reason: e.to_string(),
            },
            Err(_) => MarketInput::Unavailable {
                reason: format!("market data timed out after {} ms", timeout.as_millis()),
            },
        };
        self.last_chain = match chain {
            Ok(Ok(chain)) => Some(chain),
            Ok(Err(e)) => {
                debug!(%date, error = %e, "No option chain");
                None
            }
            Err(_) => None,
        };

        DayInput {
            market,
            proposal,
        }
    }
}
