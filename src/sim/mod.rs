// Run loop glue around the book and the order generator
pub mod driver;
pub mod ensemble;
pub mod stats;

pub use driver::Simulation;
pub use ensemble::run_ensemble;
pub use stats::{RunStats, RunSummary};
