pub mod config;
pub mod engine;
pub mod market;
pub mod persist;
pub mod sim;
pub mod telemetry;
