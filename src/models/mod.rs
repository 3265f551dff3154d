//! Data models and structures for the latency benchmark

pub mod config;
pub mod sample;

// Re-export main model types
pub use config::{Config, RunConfig};
pub use sample::{RunReport, Sample, SampleSet};
