use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace};

use crate::engine::book::PriceLevelBook;
use crate::engine::types::{BookError, BookResult};

/// Top-of-book row of the export view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NbboRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: u64,
    #[serde(rename = "BidPrice")]
    pub bid_price: Decimal,
    #[serde(rename = "BidVolume")]
    pub bid_volume: u64,
    #[serde(rename = "AskPrice")]
    pub ask_price: Decimal,
    #[serde(rename = "AskVolume")]
    pub ask_volume: u64,
}

impl From<&PriceLevelBook> for NbboRow {
    fn from(book: &PriceLevelBook) -> Self {
        NbboRow {
            timestamp: book.timestamp(),
            bid_price: book.best_bid(),
            bid_volume: book.best_bid_volume(),
            ask_price: book.best_ask(),
            ask_volume: book.best_ask_volume(),
        }
    }
}

/// Timestamp-ordered run of book snapshots.
#[derive(Debug, Clone)]
pub struct BookHistory {
    start_time: u64,
    end_time: u64,
    tick: Decimal,
    book_depth: usize,
    current_best_bid: Option<Decimal>,
    current_best_ask: Option<Decimal>,
    snapshots: Vec<PriceLevelBook>,
}

impl BookHistory {
    pub fn new(start_time: u64, tick: Decimal, book_depth: usize) -> Self {
        BookHistory {
            start_time,
            end_time: start_time,
            tick,
            book_depth,
            current_best_bid: None,
            current_best_ask: None,
            snapshots: Vec::new(),
        }
    }

    /// History holding `initial`, restamped to `start_time`.
    pub fn seeded(start_time: u64, initial: PriceLevelBook) -> Self {
        let mut history = BookHistory::new(start_time, initial.tick(), initial.depth());
        history.insert(initial.with_timestamp(start_time));
        history
    }

    pub fn insert(&mut self, snapshot: PriceLevelBook) {
        if snapshot.timestamp() >= self.end_time {
            self.end_time = snapshot.timestamp();
            self.current_best_bid = Some(snapshot.best_bid());
            self.current_best_ask = Some(snapshot.best_ask());
            trace!(ts = snapshot.timestamp(), "Appended snapshot");
            self.snapshots.push(snapshot);
        } else {
            // Leftmost slot among equal timestamps keeps the run sorted
            let ts = snapshot.timestamp();
            let index = self.snapshots.partition_point(|s| s.timestamp() < ts);
            debug!(ts, index, end_time = self.end_time, "Inserted out-of-order snapshot");
            self.snapshots.insert(index, snapshot);
        }
    }

    pub fn latest(&self) -> BookResult<&PriceLevelBook> {
        self.snapshots.last().ok_or(BookError::EmptyHistory)
    }

    /// Last snapshot stamped at or before `timestamp`, `None` if the history starts later.
    pub fn at_or_before(&self, timestamp: u64) -> BookResult<Option<&PriceLevelBook>> {
        if self.snapshots.is_empty() {
            return Err(BookError::EmptyHistory);
        }
        let after = self.snapshots.partition_point(|s| s.timestamp() <= timestamp);
        Ok(after.checked_sub(1).map(|index| &self.snapshots[index]))
    }

    pub fn nbbo(&self) -> impl Iterator<Item = NbboRow> + '_ {
        self.snapshots.iter().map(NbboRow::from)
    }

    pub fn snapshots(&self) -> &[PriceLevelBook] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    pub fn tick(&self) -> Decimal {
        self.tick
    }

    pub fn book_depth(&self) -> usize {
        self.book_depth
    }

    pub fn current_best_bid(&self) -> Option<Decimal> {
        self.current_best_bid
    }

    pub fn current_best_ask(&self) -> Option<Decimal> {
        self.current_best_ask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Order, OrderType, Side};
    use rust_decimal_macros::dec;

    fn base() -> PriceLevelBook {
        PriceLevelBook::initial(dec!(0.01), dec!(100.00), dec!(100.01), 3).unwrap()
    }

    // Distinguishable snapshot: best bid volume carries `marker`
    fn snap(ts: u64, marker: u64) -> PriceLevelBook {
        let order = Order { id: marker, timestamp: ts, order_type: OrderType::Limit, side: Side::Buy, level: 1, quantity: marker };
        base().apply(&order).unwrap()
    }

    fn stamps(history: &BookHistory) -> Vec<u64> {
        history.snapshots().iter().map(|s| s.timestamp()).collect()
    }

    #[test]
    fn test_empty_history() {
        let history = BookHistory::new(0, dec!(0.01), 3);
        assert_eq!(history.latest(), Err(BookError::EmptyHistory));
        assert_eq!(history.at_or_before(10), Err(BookError::EmptyHistory));
    }

    #[test]
    fn test_in_order_append_tracks_end_time() {
        let mut history = BookHistory::seeded(0, base());
        history.insert(snap(5, 1));
        history.insert(snap(9, 2));
        assert_eq!(history.end_time(), 9);
        assert_eq!(history.latest().unwrap().timestamp(), 9);
        assert_eq!(history.current_best_bid(), Some(dec!(100.00)));
        assert_eq!(stamps(&history), vec![0, 5, 9]);
    }

    #[test]
    fn test_out_of_order_insert_stays_sorted() {
        let mut history = BookHistory::seeded(0, base());
        history.insert(snap(10, 1));
        history.insert(snap(20, 2));
        history.insert(snap(15, 3));
        assert_eq!(stamps(&history), vec![0, 10, 15, 20]);
        assert_eq!(history.end_time(), 20);
        assert_eq!(history.latest().unwrap().timestamp(), 20);
    }

    #[test]
    fn test_late_duplicate_goes_before_equals() {
        let mut history = BookHistory::seeded(0, base());
        history.insert(snap(10, 1));
        history.insert(snap(20, 2));
        history.insert(snap(10, 3));
        let markers: Vec<u64> = history.snapshots().iter().map(|s| s.best_bid_volume()).collect();
        assert_eq!(markers, vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_at_or_before() {
        let mut history = BookHistory::new(5, dec!(0.01), 3);
        history.insert(snap(5, 1));
        history.insert(snap(10, 2));
        history.insert(snap(10, 3));
        history.insert(snap(30, 4));

        assert_eq!(history.at_or_before(4), Ok(None));
        assert_eq!(history.at_or_before(5).unwrap().unwrap().timestamp(), 5);
        assert_eq!(history.at_or_before(10).unwrap().unwrap().best_bid_volume(), 4);
        assert_eq!(history.at_or_before(29).unwrap().unwrap().timestamp(), 10);
        assert_eq!(history.at_or_before(1_000).unwrap().unwrap().timestamp(), 30);
    }

    #[test]
    fn test_nbbo_view() {
        let history = BookHistory::seeded(0, base());
        let rows: Vec<NbboRow> = history.nbbo().collect();
        assert_eq!(
            rows,
            vec![NbboRow { timestamp: 0, bid_price: dec!(100.00), bid_volume: 1, ask_price: dec!(100.01), ask_volume: 1 }]
        );
    }
}
