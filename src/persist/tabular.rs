use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::engine::history::BookHistory;
use crate::persist::types::PersistResult;

/// Write the top-of-book view, one row per snapshot, with a header row.
pub fn write_nbbo_to<W: Write>(history: &BookHistory, writer: W) -> PersistResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for row in history.nbbo() {
        csv_writer.serialize(row)?;
        rows += 1;
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn write_nbbo(history: &BookHistory, path: &Path) -> PersistResult<usize> {
    let rows = write_nbbo_to(history, File::create(path)?)?;
    info!(path = %path.display(), rows, "Wrote NBBO history");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::book::PriceLevelBook;
    use crate::engine::types::{Order, OrderType, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn test_nbbo_csv_layout() {
        let start = PriceLevelBook::initial(dec!(0.01), dec!(100.00), dec!(100.01), 3).unwrap();
        let order = Order { id: 1, timestamp: 25, order_type: OrderType::Limit, side: Side::Buy, level: 1, quantity: 4 };
        let next = start.apply(&order).unwrap();
        let mut history = BookHistory::seeded(0, start);
        history.insert(next);

        let mut buf = Vec::new();
        assert_eq!(write_nbbo_to(&history, &mut buf).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Timestamp,BidPrice,BidVolume,AskPrice,AskVolume\n\
             0,100.00,1,100.01,1\n\
             25,100.00,5,100.01,1\n"
        );
    }

    #[test]
    fn test_nbbo_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nbbo.csv");
        let history = BookHistory::seeded(0, PriceLevelBook::initial(dec!(0.5), dec!(10), dec!(11), 2).unwrap());
        assert_eq!(write_nbbo(&history, &path).unwrap(), 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("0,10,1,11,1"));
    }
}
