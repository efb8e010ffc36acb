//! Pure conversions between in-memory books and the serializable record types.
//!
//! This file MUST NOT touch the filesystem. Only struct <-> struct mapping lives here.

use crate::engine::book::PriceLevelBook;
use crate::engine::types::{Side, Trade};
use crate::persist::types::{PersistError, PersistResult, SnapshotRecord, TradeRecord, SNAPSHOT_SCHEMA_VERSION};

/// Build a `SnapshotRecord` from a book. Volumes are cut to the visible depth.
pub fn from_book(book: &PriceLevelBook) -> SnapshotRecord {
    SnapshotRecord {
        version: SNAPSHOT_SCHEMA_VERSION,
        timestamp: book.timestamp(),
        best_bid: book.best_bid(),
        best_ask: book.best_ask(),
        spread_ticks: book.spread_ticks(),
        bids: book.depth_view(Side::Buy).to_vec(),
        asks: book.depth_view(Side::Sell).to_vec(),
        trades: book.trades().iter().map(trade_record).collect(),
    }
}

fn trade_record(trade: &Trade) -> TradeRecord {
    TradeRecord {
        exec_id: trade.exec_id,
        order_id: trade.order_id,
        price: trade.price,
        quantity: trade.quantity,
        order_type: trade.order_type,
    }
}

/// Reject records written under another schema version.
pub fn check_version(record: &SnapshotRecord) -> PersistResult<()> {
    if record.version != SNAPSHOT_SCHEMA_VERSION {
        return Err(PersistError::FormatMismatch(record.version));
    }
    Ok(())
}
