pub mod types;
pub use types::*;
pub mod snapshot;
pub mod jsonl;
pub mod tabular;

use std::path::Path;

use crate::engine::history::BookHistory;

/// Write `history` to `path` in the requested format, returning the number of rows.
pub fn export(history: &BookHistory, path: &Path, format: OutputFormat) -> PersistResult<usize> {
    match format {
        OutputFormat::Csv => tabular::write_nbbo(history, path),
        OutputFormat::Jsonl => jsonl::write_snapshots(history, path),
    }
}
