// Stochastic order flow feeding the book
pub mod generator;

pub use generator::{OrderGenerator, RateConfig, SideModel};
