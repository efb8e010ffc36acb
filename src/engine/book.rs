use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::engine::types::{BookError, BookResult, Order, OrderType, Side, SweepMode, Trade};

/// Aggregated price-level book at one instant.
///
/// Index 0 of each volume array is the volume resting at that side's best
/// price, index `i` is the volume `i` ticks further from the midpoint. Both
/// arrays always hold at least `depth` entries. A book is never mutated once
/// built: `apply` derives a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceLevelBook {
    timestamp: u64,
    tick: Decimal,
    depth: usize,
    best_bid: Decimal,
    best_ask: Decimal,
    spread_ticks: usize,
    bid_volumes: Vec<u64>,
    ask_volumes: Vec<u64>,
    trades: Vec<Trade>,
    sweep_mode: SweepMode,
    next_exec_id: u64,
}

fn spread_in_ticks(best_bid: Decimal, best_ask: Decimal, tick: Decimal) -> Option<usize> {
    ((best_ask - best_bid) / tick)
        .round()
        .to_usize()
        .filter(|ticks| *ticks >= 1)
}

impl PriceLevelBook {
    /// Starting book: `depth` unit-volume levels on both sides, at time zero.
    #[instrument]
    pub fn initial(tick: Decimal, best_bid: Decimal, best_ask: Decimal, depth: usize) -> BookResult<Self> {
        if tick <= Decimal::ZERO {
            return Err(BookError::InvalidConfiguration(format!("tick size must be positive, got {tick}")));
        }
        if depth == 0 {
            return Err(BookError::InvalidConfiguration("book depth must be positive".into()));
        }
        if best_bid <= Decimal::ZERO {
            return Err(BookError::InvalidConfiguration(format!("best bid must be positive, got {best_bid}")));
        }
        let spread_ticks = spread_in_ticks(best_bid, best_ask, tick).ok_or_else(|| {
            BookError::InvalidConfiguration(format!(
                "best ask {best_ask} must sit at least one tick above best bid {best_bid}"
            ))
        })?;

        info!(%tick, %best_bid, %best_ask, depth, spread_ticks, "Initialized price level book");
        Ok(PriceLevelBook {
            timestamp: 0,
            tick,
            depth,
            best_bid,
            best_ask,
            spread_ticks,
            bid_volumes: vec![1; depth],
            ask_volumes: vec![1; depth],
            trades: Vec::new(),
            sweep_mode: SweepMode::default(),
            next_exec_id: 1,
        })
    }

    pub fn with_sweep_mode(mut self, sweep_mode: SweepMode) -> Self {
        self.sweep_mode = sweep_mode;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn tick(&self) -> Decimal {
        self.tick
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn best_bid(&self) -> Decimal {
        self.best_bid
    }

    pub fn best_ask(&self) -> Decimal {
        self.best_ask
    }

    pub fn spread_ticks(&self) -> usize {
        self.spread_ticks
    }

    pub fn mid_price(&self) -> Decimal {
        (self.best_bid + self.best_ask) / Decimal::TWO
    }

    pub fn sweep_mode(&self) -> SweepMode {
        self.sweep_mode
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn bid_volumes(&self) -> &[u64] {
        &self.bid_volumes
    }

    pub fn ask_volumes(&self) -> &[u64] {
        &self.ask_volumes
    }

    pub fn volumes(&self, side: Side) -> &[u64] {
        match side {
            Side::Buy => &self.bid_volumes,
            Side::Sell => &self.ask_volumes,
        }
    }

    /// The first `depth` levels of one side; anything past that is not part of the visible book.
    pub fn depth_view(&self, side: Side) -> &[u64] {
        let volumes = self.volumes(side);
        &volumes[..self.depth.min(volumes.len())]
    }

    pub fn best_bid_volume(&self) -> u64 {
        self.bid_volumes.first().copied().unwrap_or(0)
    }

    pub fn best_ask_volume(&self) -> u64 {
        self.ask_volumes.first().copied().unwrap_or(0)
    }

    /// Price of the level `index` ticks behind the best on `side`.
    pub fn price_at(&self, side: Side, index: usize) -> Decimal {
        match side {
            Side::Buy => self.best_bid - self.tick * Decimal::from(index),
            Side::Sell => self.best_ask + self.tick * Decimal::from(index),
        }
    }

    /// Checks everything a book must satisfy at rest.
    pub fn check_invariants(&self) -> BookResult<()> {
        let violation = |reason: String| BookError::CorruptBook { timestamp: self.timestamp, reason };
        match spread_in_ticks(self.best_bid, self.best_ask, self.tick) {
            Some(ticks) if ticks == self.spread_ticks => {}
            Some(ticks) => {
                return Err(violation(format!("cached spread {} != computed {}", self.spread_ticks, ticks)));
            }
            None => {
                return Err(violation(format!("non-positive spread: bid {} ask {}", self.best_bid, self.best_ask)));
            }
        }
        if self.bid_volumes.len() < self.depth || self.ask_volumes.len() < self.depth {
            return Err(violation(format!(
                "volume arrays shorter than depth {}: bids {}, asks {}",
                self.depth,
                self.bid_volumes.len(),
                self.ask_volumes.len()
            )));
        }
        Ok(())
    }

    /// Derive the book that results from `order`. `self` is left untouched.
    #[instrument(level = "trace", skip(self), fields(order_id = order.id))]
    pub fn apply(&self, order: &Order) -> BookResult<PriceLevelBook> {
        debug!(
            id = order.id,
            order_type = order.order_type.as_str(),
            side = ?order.side,
            level = order.level,
            qty = order.quantity,
            "Applying order"
        );

        let mut next = PriceLevelBook {
            timestamp: order.timestamp,
            bid_volumes: self.bid_volumes.clone(),
            ask_volumes: self.ask_volumes.clone(),
            trades: Vec::new(),
            ..*self
        };

        match order.order_type {
            OrderType::Limit => next.apply_limit(order)?,
            OrderType::Cancel => next.apply_cancel(order),
            OrderType::Market => next.apply_market(order),
            OrderType::Midpoint => {
                let error = BookError::UnsupportedOrderType(order.order_type);
                warn!(id = order.id, error = %error, "Rejecting order");
                return Err(error);
            }
        }

        next.pad();
        next.refresh_spread(order.id)?;
        trace!(
            best_bid = %next.best_bid,
            best_ask = %next.best_ask,
            spread = next.spread_ticks,
            trades = next.trades.len(),
            "Order applied"
        );
        Ok(next)
    }

    // One tick away from the midpoint on `side`
    fn outward(&self, side: Side) -> Decimal {
        match side {
            Side::Buy => -self.tick,
            Side::Sell => self.tick,
        }
    }

    fn side_mut(&mut self, side: Side) -> (&mut Vec<u64>, &mut Decimal) {
        match side {
            Side::Buy => (&mut self.bid_volumes, &mut self.best_bid),
            Side::Sell => (&mut self.ask_volumes, &mut self.best_ask),
        }
    }

    fn apply_limit(&mut self, order: &Order) -> BookResult<()> {
        let spread = self.spread_ticks;
        if order.level == 0 {
            let error = BookError::BookInvariantViolation {
                order_id: order.id,
                reason: format!("limit at level 0 would lock the book (spread {spread} ticks)"),
            };
            warn!(id = order.id, error = %error, "Rejecting limit order");
            return Err(error);
        }

        let step = self.outward(order.side);
        let (volumes, best) = self.side_mut(order.side);

        if order.level >= spread {
            // Rests at or behind the current best
            let index = order.level - spread;
            if volumes.len() <= index {
                volumes.resize(index + 1, 0);
            }
            volumes[index] += order.quantity;
            if index == 0 && volumes[0] == 0 {
                volumes.remove(0);
                *best += step;
                debug!(id = order.id, best = %best, "Dropped empty best level");
            }
        } else {
            // Improves the best: the new level starts with exactly this order's quantity, even zero
            let shift = spread - order.level;
            volumes.splice(0..0, std::iter::repeat(0).take(shift));
            volumes[0] = order.quantity;
            *best -= step * Decimal::from(shift);
            debug!(id = order.id, best = %best, shift, "Limit order improved best price");
        }
        Ok(())
    }

    fn apply_cancel(&mut self, order: &Order) {
        let step = self.outward(order.side);
        let (volumes, best) = self.side_mut(order.side);

        let Some(resting) = volumes.get_mut(order.level) else {
            trace!(id = order.id, level = order.level, "Cancel beyond tracked levels");
            return;
        };
        let removed = (*resting).min(order.quantity);
        *resting -= removed;

        if order.level == 0 && volumes[0] == 0 {
            volumes.remove(0);
            *best += step;
            debug!(id = order.id, best = %best, "Best level exhausted by cancel");
        }
    }

    fn apply_market(&mut self, order: &Order) {
        // A buy lifts the asks, a sell hits the bids
        let consumed_side = match order.side {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        };
        let step = self.outward(consumed_side);
        let sweep_mode = self.sweep_mode;
        let mut exec_id = self.next_exec_id;
        let mut trades = Vec::new();
        let mut fill = |price: Decimal, quantity: u64| {
            trades.push(Trade {
                exec_id,
                order_id: order.id,
                timestamp: order.timestamp,
                price,
                quantity,
                order_type: OrderType::Market,
            });
            exec_id += 1;
        };

        let (volumes, best) = self.side_mut(consumed_side);
        match sweep_mode {
            SweepMode::Depth => {
                let consumed = order.level + 1;
                if volumes.len() < consumed {
                    volumes.resize(consumed, 0);
                }
                for (index, quantity) in volumes.drain(..consumed).enumerate() {
                    fill(*best + step * Decimal::from(index), quantity);
                }
                *best += step * Decimal::from(consumed);
            }
            SweepMode::Quantity => {
                let mut remaining = order.quantity;
                while remaining > 0 && !volumes.is_empty() {
                    let available = volumes[0];
                    let filled = available.min(remaining);
                    if filled > 0 {
                        fill(*best, filled);
                    }
                    remaining -= filled;
                    if filled == available {
                        volumes.remove(0);
                        *best += step;
                    } else {
                        volumes[0] -= filled;
                    }
                }
                if remaining > 0 {
                    debug!(id = order.id, remaining, "Market order ran out of tracked liquidity");
                }
            }
        }

        debug!(id = order.id, fills = trades.len(), best = %best, "Market order swept");
        self.next_exec_id = exec_id;
        self.trades = trades;
    }

    // Right-pad both sides back up to depth and drop empty tail levels past it
    fn pad(&mut self) {
        for volumes in [&mut self.bid_volumes, &mut self.ask_volumes] {
            if volumes.len() < self.depth {
                volumes.resize(self.depth, 0);
            }
            while volumes.len() > self.depth && volumes.last() == Some(&0) {
                volumes.pop();
            }
        }
    }

    fn refresh_spread(&mut self, order_id: u64) -> BookResult<()> {
        match spread_in_ticks(self.best_bid, self.best_ask, self.tick) {
            Some(ticks) => {
                self.spread_ticks = ticks;
                Ok(())
            }
            None => {
                let error = BookError::BookInvariantViolation {
                    order_id,
                    reason: format!("non-positive spread: bid {} ask {}", self.best_bid, self.best_ask),
                };
                warn!(id = order_id, error = %error, "Order would cross the book");
                Err(error)
            }
        }
    }
}
