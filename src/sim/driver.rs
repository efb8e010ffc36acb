use anyhow::Context;
use tracing::{info, instrument, trace, warn};

use crate::config::SimConfig;
use crate::engine::history::BookHistory;
use crate::engine::types::{BookResult, Order};
use crate::market::generator::OrderGenerator;
use crate::sim::stats::{RunStats, RunSummary};

/// One closed-loop run: generate an order from the latest book, apply it, append the result.
pub struct Simulation {
    end_time: u64,
    max_events: Option<u64>,
    history: BookHistory,
    generator: OrderGenerator,
    stats: RunStats,
}

impl Simulation {
    pub fn new(config: &SimConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid simulation settings")?;
        let initial = config.initial_book().context("invalid starting book")?;
        let generator = OrderGenerator::new(config.rate_config(), config.seed).context("invalid order rates")?;
        let stats = RunStats::new().context("spread histogram")?;

        Ok(Simulation {
            end_time: config.end_time,
            max_events: config.max_events,
            history: BookHistory::seeded(config.start_time, initial),
            generator,
            stats,
        })
    }

    /// Generate, apply and record a single order.
    #[instrument(level = "trace", skip(self))]
    pub fn step(&mut self) -> BookResult<Order> {
        let snapshot = self.history.latest()?;
        let order = self.generator.next(snapshot);
        let next = snapshot.apply(&order)?;

        self.stats.record(&order, &next);
        metrics::counter!("lobsim_orders_total", "type" => order.order_type.as_str()).increment(1);
        metrics::counter!("lobsim_trades_total").increment(next.trades().len() as u64);
        metrics::gauge!("lobsim_spread_ticks").set(next.spread_ticks() as f64);
        trace!(id = order.id, ts = next.timestamp(), spread = next.spread_ticks(), "Step complete");

        self.history.insert(next);
        Ok(order)
    }

    /// Step until the history reaches the configured end time.
    pub fn run(&mut self) -> BookResult<RunSummary> {
        info!(
            seed = self.generator.seed(),
            start_time = self.history.start_time(),
            end_time = self.end_time,
            "Starting simulation"
        );
        while self.history.end_time() < self.end_time {
            if self.max_events.is_some_and(|max| self.stats.orders() >= max) {
                warn!(events = self.stats.orders(), ts = self.history.end_time(), "Event cap reached before end time");
                break;
            }
            self.step()?;
        }

        let summary = self.summary();
        info!(
            seed = summary.seed,
            snapshots = summary.snapshots,
            trades = summary.trades,
            spread_p50 = summary.spread_p50,
            spread_max = summary.spread_max,
            "Simulation finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        self.stats.summary(self.generator.seed(), &self.history)
    }

    pub fn history(&self) -> &BookHistory {
        &self.history
    }

    pub fn into_history(self) -> BookHistory {
        self.history
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }
}
