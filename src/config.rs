use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::engine::book::PriceLevelBook;
use crate::engine::types::{BookError, BookResult, SweepMode};
use crate::market::generator::{RateConfig, SideModel};
use crate::persist::OutputFormat;

/// Flat settings object for one simulation run.
///
/// Sources, lowest precedence first: built-in defaults, the settings file
/// (`lobsim.{toml,yaml,json}` in the working directory, or an explicit path),
/// then `LOBSIM_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub start_time: u64,
    pub end_time: u64,
    pub timestep_ms: u64,
    pub tick_size: Decimal,
    pub start_bid: Decimal,
    pub start_ask: Decimal,
    pub max_depth: usize,
    pub market_order_rate: f64,
    pub limit_order_rate: f64,
    pub cancel_order_rate: f64,
    pub market_volume_rate: f64,
    pub limit_volume_rate: f64,
    pub cancel_volume_rate: f64,
    pub mean_reversion: f64,
    pub mean_deviation: f64,
    pub drift: f64,
    pub side_model: SideModel,
    pub sweep_mode: SweepMode,
    pub allow_market_orders: bool,
    pub allow_cancel_orders: bool,
    pub seed: Option<u64>,
    /// Stop after this many orders even if `end_time` has not been reached.
    pub max_events: Option<u64>,
    pub output_file: PathBuf,
    pub output_format: OutputFormat,
    pub log_level: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        let rates = RateConfig::default();
        SimConfig {
            start_time: 0,
            end_time: 60_000,
            timestep_ms: rates.timestep_ms,
            tick_size: Decimal::new(1, 2),
            start_bid: Decimal::new(10_000, 2),
            start_ask: Decimal::new(10_001, 2),
            max_depth: 5,
            market_order_rate: rates.market_order_rate,
            limit_order_rate: rates.limit_order_rate,
            cancel_order_rate: rates.cancel_order_rate,
            market_volume_rate: rates.market_volume_rate,
            limit_volume_rate: rates.limit_volume_rate,
            cancel_volume_rate: rates.cancel_volume_rate,
            mean_reversion: rates.mean_reversion,
            mean_deviation: rates.mean_deviation,
            drift: rates.drift,
            side_model: rates.side_model,
            sweep_mode: SweepMode::default(),
            allow_market_orders: rates.allow_market_orders,
            allow_cancel_orders: rates.allow_cancel_orders,
            seed: None,
            max_events: None,
            output_file: PathBuf::from("simulation_result.csv"),
            output_format: OutputFormat::Csv,
            log_level: "info".to_string(),
        }
    }
}

impl SimConfig {
    pub fn load(path: Option<&Path>) -> Result<SimConfig, config::ConfigError> {
        dotenvy::dotenv().ok(); // load .env

        let file = match path {
            Some(path) => config::File::from(path.to_path_buf()),
            None => config::File::with_name("lobsim").required(false),
        };
        config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("LOBSIM").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> BookResult<()> {
        if self.end_time < self.start_time {
            return Err(BookError::InvalidConfiguration(format!(
                "end_time {} precedes start_time {}",
                self.end_time, self.start_time
            )));
        }
        self.rate_config().validate()
    }

    pub fn rate_config(&self) -> RateConfig {
        RateConfig {
            market_order_rate: self.market_order_rate,
            limit_order_rate: self.limit_order_rate,
            cancel_order_rate: self.cancel_order_rate,
            market_volume_rate: self.market_volume_rate,
            limit_volume_rate: self.limit_volume_rate,
            cancel_volume_rate: self.cancel_volume_rate,
            mean_reversion: self.mean_reversion,
            mean_deviation: self.mean_deviation,
            drift: self.drift,
            side_model: self.side_model,
            allow_market_orders: self.allow_market_orders,
            allow_cancel_orders: self.allow_cancel_orders,
            timestep_ms: self.timestep_ms,
        }
    }

    pub fn initial_book(&self) -> BookResult<PriceLevelBook> {
        Ok(PriceLevelBook::initial(self.tick_size, self.start_bid, self.start_ask, self.max_depth)?
            .with_sweep_mode(self.sweep_mode))
    }
}
