//! Pool Latency Bench
//!
//! A bounded-concurrency latency benchmark: fires a configurable number of
//! database point lookups or HTTP GET requests through a fixed-size worker
//! pool, records the latency of every invocation, optionally writes
//! diagnostic snapshots while the run is in flight, and renders a
//! latency-over-time chart.

pub mod app;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod sampler;
pub mod stats;
pub mod task;
pub mod types;

// Re-export commonly used types
pub use app::{App, HarnessOutcome};
pub use error::{AppError, Result};
pub use models::{Config, RunConfig, RunReport, Sample, SampleSet};
pub use sampler::Sampler;
pub use stats::LatencyStatistics;
pub use task::{Task, TaskFactory, TaskOutcome};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_LOOP: u32 = 100;
    pub const DEFAULT_CONCURRENCY: u32 = 10;
    /// Zero disables diagnostic snapshots
    pub const DEFAULT_DUMP_INTERVAL_MS: u64 = 0;
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_LOOKUP_KEY: &str = "1234";
    pub const DEFAULT_LOOKUP_QUERY: &str = "SELECT test FROM test WHERE id = ?";
    pub const DEFAULT_CHART_PATH: &str = "latency.svg";
    pub const DEFAULT_DUMP_DIR: &str = ".";
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const MAX_LOOP: u32 = 1_000_000;
    pub const MAX_CONCURRENCY: u32 = 4_096;
    pub const MAX_DEADLINE_SECS: u64 = 86_400;
    pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
}
