use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::engine::history::BookHistory;
use crate::persist::snapshot;
use crate::persist::types::{PersistResult, SnapshotRecord};

/// Convert a snapshot record into a single JSON line (no trailing newline).
pub fn record_to_json(record: &SnapshotRecord) -> PersistResult<String> {
    Ok(serde_json::to_string(record)?)
}

/// Parse one line written by `record_to_json`.
pub fn record_from_json(s: &str) -> PersistResult<SnapshotRecord> {
    let record: SnapshotRecord = serde_json::from_str(s)?;
    snapshot::check_version(&record)?;
    Ok(record)
}

pub fn write_snapshots_to<W: Write>(history: &BookHistory, mut writer: W) -> PersistResult<usize> {
    let mut written = 0;
    for book in history.snapshots() {
        serde_json::to_writer(&mut writer, &snapshot::from_book(book))?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

pub fn write_snapshots(history: &BookHistory, path: &Path) -> PersistResult<usize> {
    let written = write_snapshots_to(history, BufWriter::new(File::create(path)?))?;
    info!(path = %path.display(), rows = written, "Wrote snapshot lines");
    Ok(written)
}

pub fn read_snapshots(path: &Path) -> PersistResult<Vec<SnapshotRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(record_from_json(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::book::PriceLevelBook;
    use crate::engine::types::{Order, OrderType, Side};
    use rust_decimal_macros::dec;

    fn history() -> BookHistory {
        let start = PriceLevelBook::initial(dec!(0.01), dec!(100.00), dec!(100.01), 3).unwrap();
        let order = Order { id: 1, timestamp: 40, order_type: OrderType::Market, side: Side::Buy, level: 1, quantity: 0 };
        let next = start.apply(&order).unwrap();
        let mut history = BookHistory::seeded(0, start);
        history.insert(next);
        history
    }

    #[test]
    fn test_one_line_per_snapshot() {
        let mut buf = Vec::new();
        assert_eq!(write_snapshots_to(&history(), &mut buf).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let second = record_from_json(lines[1]).unwrap();
        assert_eq!(second.timestamp, 40);
        assert_eq!(second.best_ask, dec!(100.03));
        assert_eq!(second.asks, vec![1, 0, 0]);
        assert_eq!(second.trades.len(), 2);
    }

    #[test]
    fn test_file_output_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        write_snapshots(&history(), &path).unwrap();
        let records = read_snapshots(&path).unwrap();
        assert_eq!(records.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![0, 40]);
    }

    #[test]
    fn test_garbage_line_is_an_error() {
        assert!(record_from_json("{not json").is_err());
    }
}
