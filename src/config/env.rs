//! Environment variable handling and .env file management

use crate::defaults;
use crate::error::{AppError, Result};
use crate::types::{LogFormat, TargetKind};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file if it exists; variables already set win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                println!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            println!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Pool Latency Bench Configuration
#
# Values here are used as defaults and can be overridden by command-line
# arguments.

# Which operation each invocation performs: http or db
# TARGET=http

# URL requested by the HTTP target
# TARGET_URL=http://localhost:8080/health

# Database for the DB target (sqlite only)
# DATABASE_URL=sqlite://bench.db

# Key and single-parameter query used by the DB target
# LOOKUP_KEY=1234
# LOOKUP_QUERY=SELECT test FROM test WHERE id = ?

# Total invocations and worker pool size
# LOOP=1000
# CONCURRENCY=50

# Diagnostic snapshot interval in milliseconds (0 disables)
# DUMP_INTERVAL_MS=0
# DUMP_DIR=.

# Maximum wait for the pool to drain, and per-invocation timeout
# DEADLINE_SECONDS=300
# REQUEST_TIMEOUT_SECONDS=10

# Database pool size (defaults to CONCURRENCY)
# DB_POOL_SIZE=50

# Output artifacts
# CHART_PATH=latency.svg
# CSV_PATH=samples.csv

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Log entry format: console, json or compact
# LOG_FORMAT=console
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "TARGET" => {
                value
                    .parse::<TargetKind>()
                    .map_err(|e| AppError::config(format!("Invalid TARGET value '{}': {}", value, e)))?;
            }
            "TARGET_URL" => {
                let parsed = url::Url::parse(value.trim())
                    .map_err(|e| AppError::config(format!("Invalid TARGET_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("TARGET_URL must use http or https: {}", value)));
                }
            }
            "DATABASE_URL" => {
                if !value.trim().starts_with("sqlite:") {
                    return Err(AppError::config(format!("DATABASE_URL must be a sqlite: URL, got '{}'", value)));
                }
            }
            "LOOKUP_QUERY" => {
                if value.matches('?').count() != 1 {
                    return Err(AppError::config("LOOKUP_QUERY must contain exactly one '?' placeholder"));
                }
            }
            "LOOP" => Self::validate_range(key, value, 1, u64::from(defaults::MAX_LOOP))?,
            "CONCURRENCY" => Self::validate_range(key, value, 1, u64::from(defaults::MAX_CONCURRENCY))?,
            "DUMP_INTERVAL_MS" => Self::validate_range(key, value, 0, u64::MAX)?,
            "DEADLINE_SECONDS" => Self::validate_range(key, value, 1, defaults::MAX_DEADLINE_SECS)?,
            "REQUEST_TIMEOUT_SECONDS" => Self::validate_range(key, value, 1, defaults::MAX_REQUEST_TIMEOUT_SECS)?,
            "DB_POOL_SIZE" => Self::validate_range(key, value, 1, u64::from(u32::MAX))?,
            "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            "LOG_FORMAT" => {
                value
                    .parse::<LogFormat>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown or free-form variable
            }
        }

        Ok(())
    }

    fn validate_range(key: &str, value: &str, min: u64, max: u64) -> Result<()> {
        let parsed: u64 = value
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("TARGET", "Operation per invocation: http or db", "db"),
            ("TARGET_URL", "URL requested by the HTTP target", "http://localhost:8080/health"),
            ("DATABASE_URL", "SQLite database for the DB target", "sqlite://bench.db"),
            ("LOOKUP_KEY", "Key bound into the lookup query", "1234"),
            ("LOOKUP_QUERY", "Lookup query with one '?' placeholder", "SELECT test FROM test WHERE id = ?"),
            ("LOOP", "Total number of invocations (1-1000000)", "1000"),
            ("CONCURRENCY", "Worker pool size (1-4096)", "50"),
            ("DUMP_INTERVAL_MS", "Diagnostic snapshot interval, 0 disables", "500"),
            ("DEADLINE_SECONDS", "Maximum wait for the run (1-86400)", "300"),
            ("REQUEST_TIMEOUT_SECONDS", "Per-invocation timeout (1-300)", "10"),
            ("DB_POOL_SIZE", "Database pool size, defaults to CONCURRENCY", "50"),
            ("CHART_PATH", "Where the latency chart is written", "latency.svg"),
            ("CSV_PATH", "Optional CSV export of every sample", "samples.csv"),
            ("DUMP_DIR", "Directory for diagnostic snapshots", "."),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("LOG_FORMAT", "Log entry format: console, json or compact", "json"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Validate the contents of an env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value.trim()) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}
