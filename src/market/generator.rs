use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Exp, Normal};
use tracing::{debug, info, instrument, warn};

use crate::engine::book::PriceLevelBook;
use crate::engine::types::{BookError, BookResult, Order, OrderType, Side};

/// How the generator picks the side of each order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideModel {
    Uniform,
    #[default]
    MeanReverting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateConfig {
    pub market_order_rate: f64,
    pub limit_order_rate: f64,
    pub cancel_order_rate: f64,
    /// Mean size of a market order; the same holds for the other two volume parameters.
    pub market_volume_rate: f64,
    pub limit_volume_rate: f64,
    pub cancel_volume_rate: f64,
    pub mean_reversion: f64,
    pub mean_deviation: f64,
    pub drift: f64,
    pub side_model: SideModel,
    pub allow_market_orders: bool,
    pub allow_cancel_orders: bool,
    /// Milliseconds per unit of model time.
    pub timestep_ms: u64,
}

impl Default for RateConfig {
    fn default() -> Self {
        RateConfig {
            market_order_rate: 2.0,
            limit_order_rate: 5.0,
            cancel_order_rate: 1.0,
            market_volume_rate: 10.0,
            limit_volume_rate: 10.0,
            cancel_volume_rate: 3.0,
            mean_reversion: 0.01,
            mean_deviation: 0.2,
            drift: 0.0,
            side_model: SideModel::MeanReverting,
            allow_market_orders: true,
            allow_cancel_orders: true,
            timestep_ms: 100,
        }
    }
}

impl RateConfig {
    pub fn validate(&self) -> BookResult<()> {
        let positive = [
            ("market_order_rate", self.market_order_rate),
            ("limit_order_rate", self.limit_order_rate),
            ("cancel_order_rate", self.cancel_order_rate),
            ("market_volume_rate", self.market_volume_rate),
            ("limit_volume_rate", self.limit_volume_rate),
            ("cancel_volume_rate", self.cancel_volume_rate),
            ("mean_deviation", self.mean_deviation),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(BookError::InvalidConfiguration(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.mean_reversion.is_finite() && self.mean_reversion >= 0.0) {
            return Err(BookError::InvalidConfiguration(format!(
                "mean_reversion must be non-negative, got {}",
                self.mean_reversion
            )));
        }
        if !self.drift.is_finite() {
            return Err(BookError::InvalidConfiguration(format!("drift must be finite, got {}", self.drift)));
        }
        if self.timestep_ms == 0 {
            return Err(BookError::InvalidConfiguration("timestep_ms must be positive".into()));
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn invalid(name: &str, error: statrs::StatsError) -> BookError {
    BookError::InvalidConfiguration(format!("{name}: {error}"))
}

/// Samples the order flow driving the book.
///
/// Every event kind `(type, level)` has its own Poisson rate. The next
/// arrival is exponential in the summed rate and its kind is drawn in
/// proportion to each rate. All randomness comes from one owned, seeded
/// `Pcg64`, so a run replays exactly from its seed.
#[derive(Debug, Clone)]
pub struct OrderGenerator {
    config: RateConfig,
    rng: Pcg64,
    seed: u64,
    state: f64,
    noise: Normal,
    market_volume: Exp,
    limit_volume: Exp,
    cancel_volume: Exp,
    next_order_id: u64,
}

impl OrderGenerator {
    /// Builds a generator; `None` draws a fresh seed, which is logged so the run can be replayed.
    pub fn new(config: RateConfig, seed: Option<u64>) -> BookResult<Self> {
        config.validate()?;
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let noise = Normal::new(0.0, config.mean_deviation).map_err(|e| invalid("mean_deviation", e))?;
        let market_volume = Exp::new(1.0 / config.market_volume_rate).map_err(|e| invalid("market_volume_rate", e))?;
        let limit_volume = Exp::new(1.0 / config.limit_volume_rate).map_err(|e| invalid("limit_volume_rate", e))?;
        let cancel_volume = Exp::new(1.0 / config.cancel_volume_rate).map_err(|e| invalid("cancel_volume_rate", e))?;

        info!(seed, side_model = ?config.side_model, "Initialized order generator");
        Ok(OrderGenerator {
            config,
            rng: Pcg64::seed_from_u64(seed),
            seed,
            state: 0.0,
            noise,
            market_volume,
            limit_volume,
            cancel_volume,
            next_order_id: 1,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &RateConfig {
        &self.config
    }

    /// Current value of the mean-reverting market state.
    pub fn market_state(&self) -> f64 {
        self.state
    }

    /// Unnormalized rate of every `(type, level)` event the book currently admits.
    pub fn order_rates(&self, snapshot: &PriceLevelBook) -> Vec<((OrderType, usize), f64)> {
        let depth = snapshot.depth();
        let spread = snapshot.spread_ticks();
        let mut rates = Vec::with_capacity(1 + 2 * depth + spread);

        if self.config.allow_market_orders {
            rates.push(((OrderType::Market, 0), self.config.market_order_rate));
        }
        // Harmonic decay away from the opposite best
        for level in 1..depth + spread {
            rates.push(((OrderType::Limit, level), self.config.limit_order_rate / level as f64));
        }
        if self.config.allow_cancel_orders {
            for level in 0..depth {
                let weight = self.config.cancel_order_rate * (depth - level - 1) as f64 / depth as f64;
                rates.push(((OrderType::Cancel, level), weight));
            }
        }
        rates
    }

    #[instrument(level = "trace", skip(self, snapshot), fields(ts = snapshot.timestamp()))]
    pub fn next(&mut self, snapshot: &PriceLevelBook) -> Order {
        let side = self.sample_side();

        let rates = self.order_rates(snapshot);
        let total_rate: f64 = rates.iter().map(|(_, rate)| rate).sum();
        let (order_type, level) = match WeightedIndex::new(rates.iter().map(|(_, rate)| *rate)) {
            Ok(dist) => rates[dist.sample(&mut self.rng)].0,
            Err(e) => {
                warn!(error = %e, "Degenerate order rates, resting at own best");
                (OrderType::Limit, snapshot.spread_ticks())
            }
        };

        let volume = match order_type {
            OrderType::Market => &self.market_volume,
            OrderType::Limit => &self.limit_volume,
            OrderType::Cancel | OrderType::Midpoint => &self.cancel_volume,
        };
        let quantity = volume.sample(&mut self.rng).max(0.0) as u64;

        // Lower bound on the uniform caps the longest gap
        let u: f64 = self.rng.gen_range(1e-3..1.0);
        let gap = (-(self.config.timestep_ms as f64) * u.ln() / total_rate) as u64;

        let order = Order {
            id: self.next_order_id,
            timestamp: snapshot.timestamp().saturating_add(gap),
            order_type,
            side,
            level,
            quantity,
        };
        self.next_order_id += 1;

        debug!(
            id = order.id,
            order_type = order_type.as_str(),
            side = ?side,
            level,
            qty = quantity,
            ts = order.timestamp,
            "Generated order"
        );
        order
    }

    fn sample_side(&mut self) -> Side {
        let p_buy = match self.config.side_model {
            SideModel::Uniform => 0.5,
            SideModel::MeanReverting => {
                let shock = self.noise.sample(&mut self.rng);
                self.state += self.config.mean_reversion * (self.config.drift - self.state) + shock;
                sigmoid(self.state)
            }
        };
        if self.rng.gen_bool(p_buy.clamp(0.0, 1.0)) {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}
