pub mod book;
pub mod history;
pub mod types;

pub use book::PriceLevelBook;
pub use history::{BookHistory, NbboRow};
pub use types::*;
