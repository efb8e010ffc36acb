use rust_decimal::Decimal;

use crate::engine::types::OrderType;

#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Csv(csv::Error),
    Serialization(serde_json::Error),
    FormatMismatch(u32),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "I/O failure: {}", e),
            PersistError::Csv(e) => write!(f, "CSV error: {}", e),
            PersistError::Serialization(e) => write!(f, "Serialization error: {}", e),
            PersistError::FormatMismatch(version) => {
                write!(f, "Format mismatch: record version {} (expected {})", version, SNAPSHOT_SCHEMA_VERSION)
            }
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Csv(e) => Some(e),
            PersistError::Serialization(e) => Some(e),
            PersistError::FormatMismatch(_) => None,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl From<csv::Error> for PersistError {
    fn from(e: csv::Error) -> Self {
        PersistError::Csv(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Serialization(e)
    }
}

pub type PersistResult<T> = Result<T, PersistError>;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Top of book per snapshot
    #[default]
    Csv,
    /// Full snapshot per line
    Jsonl,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SnapshotRecord {
    pub version: u32,
    pub timestamp: u64,
    pub best_bid: Decimal,
    pub best_ask: Decimal,
    pub spread_ticks: usize,
    pub bids: Vec<u64>,
    pub asks: Vec<u64>,
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeRecord {
    pub exec_id: u64,
    pub order_id: u64,
    pub price: Decimal,
    pub quantity: u64,
    pub order_type: OrderType,
}
