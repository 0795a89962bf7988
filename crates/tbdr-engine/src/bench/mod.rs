//! Benchmark orchestration.
//!
//! Builds layers, uploads them, runs a blend strategy for a number of frames
//! through the command scheduler and reports timing.

mod config;
mod runner;

pub use config::BenchConfig;
pub use runner::{load_layers, run, run_with_layers, BenchReport, VERIFY_TOLERANCE};
