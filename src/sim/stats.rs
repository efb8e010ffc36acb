use hdrhistogram::Histogram;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::engine::book::PriceLevelBook;
use crate::engine::history::BookHistory;
use crate::engine::types::{Order, OrderType};

/// Counters gathered while a run is in flight.
#[derive(Debug, Clone)]
pub struct RunStats {
    spreads: Histogram<u64>,
    market_orders: u64,
    limit_orders: u64,
    cancel_orders: u64,
    trades: u64,
    traded_volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub snapshots: usize,
    pub end_time: u64,
    pub market_orders: u64,
    pub limit_orders: u64,
    pub cancel_orders: u64,
    pub trades: u64,
    pub traded_volume: u64,
    pub spread_p50: u64,
    pub spread_p99: u64,
    pub spread_max: u64,
    pub spread_mean: f64,
    pub final_best_bid: Option<Decimal>,
    pub final_best_ask: Option<Decimal>,
}

impl RunStats {
    pub fn new() -> Result<Self, hdrhistogram::CreationError> {
        Ok(RunStats {
            spreads: Histogram::new(3)?,
            market_orders: 0,
            limit_orders: 0,
            cancel_orders: 0,
            trades: 0,
            traded_volume: 0,
        })
    }

    pub fn record(&mut self, order: &Order, book: &PriceLevelBook) {
        match order.order_type {
            OrderType::Market => self.market_orders += 1,
            OrderType::Limit => self.limit_orders += 1,
            OrderType::Cancel => self.cancel_orders += 1,
            OrderType::Midpoint => {}
        }
        self.trades += book.trades().len() as u64;
        self.traded_volume += book.trades().iter().map(|t| t.quantity).sum::<u64>();
        if let Err(e) = self.spreads.record(book.spread_ticks() as u64) {
            warn!(spread = book.spread_ticks(), error = %e, "Spread not recorded");
        }
    }

    pub fn orders(&self) -> u64 {
        self.market_orders + self.limit_orders + self.cancel_orders
    }

    pub fn summary(&self, seed: u64, history: &BookHistory) -> RunSummary {
        let (spread_p50, spread_p99, spread_max, spread_mean) = if self.spreads.is_empty() {
            (0, 0, 0, 0.0)
        } else {
            (
                self.spreads.value_at_quantile(0.5),
                self.spreads.value_at_quantile(0.99),
                self.spreads.max(),
                self.spreads.mean(),
            )
        };
        RunSummary {
            seed,
            snapshots: history.len(),
            end_time: history.end_time(),
            market_orders: self.market_orders,
            limit_orders: self.limit_orders,
            cancel_orders: self.cancel_orders,
            trades: self.trades,
            traded_volume: self.traded_volume,
            spread_p50,
            spread_p99,
            spread_max,
            spread_mean,
            final_best_bid: history.current_best_bid(),
            final_best_ask: history.current_best_ask(),
        }
    }
}
