use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Cancel,
    /// Reserved. Never generated, rejected by `PriceLevelBook::apply`.
    Midpoint,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Cancel => "cancel",
            OrderType::Midpoint => "midpoint",
        }
    }
}

/// How a market order walks the opposite side of the book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Consume every level from the best out to `order.level`, ignoring quantity.
    #[default]
    Depth,
    /// Consume until the order's quantity is filled.
    Quantity,
}

// Order as sampled by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub timestamp: u64,
    pub order_type: OrderType,
    pub side: Side,
    // For limits: ticks from the opposite best. For cancels and market sweeps: index from own/opposite best.
    pub level: usize,
    pub quantity: u64,
}

// Fill (execution) against one price level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub exec_id: u64,
    pub order_id: u64,
    pub timestamp: u64,
    pub price: Decimal,
    pub quantity: u64,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("book invariant violated by order {order_id}: {reason}")]
    BookInvariantViolation { order_id: u64, reason: String },

    #[error("book at {timestamp} is inconsistent: {reason}")]
    CorruptBook { timestamp: u64, reason: String },

    #[error("order type {0:?} is not supported")]
    UnsupportedOrderType(OrderType),

    #[error("book history is empty")]
    EmptyHistory,
}

pub type BookResult<T> = Result<T, BookError>;
