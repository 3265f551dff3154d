//! Configuration data model and validation

use crate::defaults;
use crate::types::{AppError, LogFormat, Result, TargetKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which operation each invocation performs
    #[serde(default = "default_target")]
    pub target: TargetKind,

    /// URL requested by the HTTP target
    #[serde(default)]
    pub url: Option<String>,

    /// Connection URL for the DB target (e.g. `sqlite://bench.db`)
    #[serde(default)]
    pub database_url: Option<String>,

    /// Key bound into the lookup query
    #[serde(default = "default_lookup_key")]
    pub lookup_key: String,

    /// Single-parameter lookup query
    #[serde(default = "default_lookup_query")]
    pub lookup_query: String,

    /// Total number of task invocations
    #[serde(default = "default_loop", rename = "loop")]
    pub loop_count: u32,

    /// Worker pool size
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Diagnostic snapshot interval in milliseconds, 0 disables snapshots
    #[serde(default)]
    pub dump_interval_ms: u64,

    /// Maximum wall-clock wait for the pool to drain
    #[serde(default = "default_deadline_secs")]
    pub deadline_seconds: u64,

    /// Per-invocation timeout applied by the HTTP client and pool acquire
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_seconds: u64,

    /// Database connection pool size, defaults to the concurrency
    #[serde(default)]
    pub db_pool_size: Option<u32>,

    /// Create the default lookup table and key row before the run
    #[serde(default)]
    pub db_init: bool,

    /// Where the latency chart is written
    #[serde(default = "default_chart_path")]
    pub chart_path: String,

    /// Optional CSV export of every sample
    #[serde(default)]
    pub csv_path: Option<String>,

    /// Directory receiving diagnostic snapshot files
    #[serde(default = "default_dump_dir")]
    pub dump_dir: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Rendering of structured log entries
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

/// The immutable parameters of one sampler run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub loop_count: u32,
    pub concurrency: u32,
    pub dump_interval: Duration,
}

impl RunConfig {
    pub fn new(loop_count: u32, concurrency: u32, dump_interval: Duration) -> Self {
        Self { loop_count, concurrency, dump_interval }
    }

    /// Whether periodic diagnostic snapshots are enabled
    pub fn dump_enabled(&self) -> bool {
        !self.dump_interval.is_zero()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: default_target(),
            url: None,
            database_url: None,
            lookup_key: default_lookup_key(),
            lookup_query: default_lookup_query(),
            loop_count: default_loop(),
            concurrency: default_concurrency(),
            dump_interval_ms: defaults::DEFAULT_DUMP_INTERVAL_MS,
            deadline_seconds: default_deadline_secs(),
            request_timeout_seconds: default_request_timeout_secs(),
            db_pool_size: None,
            db_init: false,
            chart_path: default_chart_path(),
            csv_path: None,
            dump_dir: default_dump_dir(),
            enable_color: default_enable_color(),
            log_format: LogFormat::default(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for an HTTP GET run against `url`
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            target: TargetKind::Http,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Configuration for a DB lookup run against `database_url`
    pub fn db(database_url: impl Into<String>) -> Self {
        Self {
            target: TargetKind::Db,
            database_url: Some(database_url.into()),
            ..Self::default()
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.loop_count, self.concurrency, self.dump_interval())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn dump_interval(&self) -> Duration {
        Duration::from_millis(self.dump_interval_ms)
    }

    /// Pool size actually used by the DB target
    pub fn effective_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(self.concurrency).max(1)
    }

    /// Validate the configuration and return the first error found
    pub fn validate(&self) -> Result<()> {
        if self.loop_count == 0 {
            return Err(AppError::config("Loop count must be greater than 0"));
        }

        if self.loop_count > defaults::MAX_LOOP {
            return Err(AppError::config(format!(
                "Loop count cannot exceed {}",
                defaults::MAX_LOOP
            )));
        }

        if self.concurrency == 0 {
            return Err(AppError::config("Concurrency must be greater than 0"));
        }

        if self.concurrency > defaults::MAX_CONCURRENCY {
            return Err(AppError::config(format!(
                "Concurrency cannot exceed {}",
                defaults::MAX_CONCURRENCY
            )));
        }

        if self.deadline_seconds == 0 {
            return Err(AppError::config("Deadline must be greater than 0"));
        }

        if self.deadline_seconds > defaults::MAX_DEADLINE_SECS {
            return Err(AppError::config(format!(
                "Deadline cannot exceed {} seconds",
                defaults::MAX_DEADLINE_SECS
            )));
        }

        if self.request_timeout_seconds == 0 {
            return Err(AppError::config("Request timeout must be greater than 0"));
        }

        if self.request_timeout_seconds > defaults::MAX_REQUEST_TIMEOUT_SECS {
            return Err(AppError::config(format!(
                "Request timeout cannot exceed {} seconds",
                defaults::MAX_REQUEST_TIMEOUT_SECS
            )));
        }

        if self.db_pool_size == Some(0) {
            return Err(AppError::config("Database pool size must be greater than 0"));
        }

        if self.chart_path.trim().is_empty() {
            return Err(AppError::config("Chart path cannot be empty"));
        }

        match self.target {
            TargetKind::Http => self.validate_http_target(),
            TargetKind::Db => self.validate_db_target(),
        }
    }

    fn validate_http_target(&self) -> Result<()> {
        let url = self
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::config("HTTP target requires a URL (--url or TARGET_URL)"))?;

        match url::Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
            Ok(parsed) => Err(AppError::config(format!(
                "Target URL must use http or https, got '{}'",
                parsed.scheme()
            ))),
            Err(e) => Err(AppError::config(format!("Invalid target URL '{}': {}", url, e))),
        }
    }

    fn validate_db_target(&self) -> Result<()> {
        let database_url = self
            .database_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                AppError::config("DB target requires a database URL (--database-url or DATABASE_URL)")
            })?;

        if !database_url.starts_with("sqlite:") {
            return Err(AppError::config(format!(
                "Unsupported database URL '{}': only sqlite: URLs are supported",
                database_url
            )));
        }

        if self.lookup_query.matches('?').count() != 1 {
            return Err(AppError::config(
                "Lookup query must contain exactly one '?' placeholder for the key",
            ));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(target) = std::env::var("TARGET") {
            self.target = target
                .parse()
                .map_err(|e| AppError::config(format!("Invalid TARGET value '{}': {}", target, e)))?;
        }

        if let Ok(url) = std::env::var("TARGET_URL") {
            self.url = Some(url.trim().to_string()).filter(|s| !s.is_empty());
        }

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            self.database_url = Some(database_url.trim().to_string()).filter(|s| !s.is_empty());
        }

        if let Ok(key) = std::env::var("LOOKUP_KEY") {
            self.lookup_key = key;
        }

        if let Ok(query) = std::env::var("LOOKUP_QUERY") {
            self.lookup_query = query;
        }

        if let Ok(loop_count) = std::env::var("LOOP") {
            self.loop_count = loop_count
                .parse()
                .map_err(|e| AppError::config(format!("Invalid LOOP value '{}': {}", loop_count, e)))?;
        }

        if let Ok(concurrency) = std::env::var("CONCURRENCY") {
            self.concurrency = concurrency.parse().map_err(|e| {
                AppError::config(format!("Invalid CONCURRENCY value '{}': {}", concurrency, e))
            })?;
        }

        if let Ok(interval) = std::env::var("DUMP_INTERVAL_MS") {
            self.dump_interval_ms = interval.parse().map_err(|e| {
                AppError::config(format!("Invalid DUMP_INTERVAL_MS value '{}': {}", interval, e))
            })?;
        }

        if let Ok(deadline) = std::env::var("DEADLINE_SECONDS") {
            self.deadline_seconds = deadline.parse().map_err(|e| {
                AppError::config(format!("Invalid DEADLINE_SECONDS value '{}': {}", deadline, e))
            })?;
        }

        if let Ok(timeout) = std::env::var("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = timeout.parse().map_err(|e| {
                AppError::config(format!("Invalid REQUEST_TIMEOUT_SECONDS value '{}': {}", timeout, e))
            })?;
        }

        if let Ok(pool_size) = std::env::var("DB_POOL_SIZE") {
            self.db_pool_size = Some(pool_size.parse().map_err(|e| {
                AppError::config(format!("Invalid DB_POOL_SIZE value '{}': {}", pool_size, e))
            })?);
        }

        if let Ok(chart_path) = std::env::var("CHART_PATH") {
            self.chart_path = chart_path;
        }

        if let Ok(csv_path) = std::env::var("CSV_PATH") {
            self.csv_path = Some(csv_path.trim().to_string()).filter(|s| !s.is_empty());
        }

        if let Ok(dump_dir) = std::env::var("DUMP_DIR") {
            self.dump_dir = dump_dir;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse().map_err(|e| {
                AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e))
            })?;
        }

        if let Ok(log_format) = std::env::var("LOG_FORMAT") {
            self.log_format = log_format.parse().map_err(|e| {
                AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", log_format, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_target() -> TargetKind {
    TargetKind::Http
}

fn default_lookup_key() -> String {
    defaults::DEFAULT_LOOKUP_KEY.to_string()
}

fn default_lookup_query() -> String {
    defaults::DEFAULT_LOOKUP_QUERY.to_string()
}

fn default_loop() -> u32 {
    defaults::DEFAULT_LOOP
}

fn default_concurrency() -> u32 {
    defaults::DEFAULT_CONCURRENCY
}

fn default_deadline_secs() -> u64 {
    defaults::DEFAULT_DEADLINE.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    defaults::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_chart_path() -> String {
    defaults::DEFAULT_CHART_PATH.to_string()
}

fn default_dump_dir() -> String {
    defaults::DEFAULT_DUMP_DIR.to_string()
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
