//! Advisory configuration checks
//!
//! `Config::validate` rejects configurations that cannot run. The checks here
//! accept the configuration but point out settings likely to skew results.

use crate::error::Result;
use crate::models::Config;
use crate::types::TargetKind;
use colored::*;

/// Configuration validator with advisory rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run hard validation, then collect advisory warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        match config.target {
            TargetKind::Http => warnings.extend(Self::validate_http_target(config)),
            TargetKind::Db => warnings.extend(Self::validate_db_target(config)),
        }
        warnings.extend(Self::validate_run_settings(config));
        warnings.extend(Self::validate_diagnostics(config));

        Ok(warnings)
    }

    fn validate_http_target(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let Some(parsed) = config.url.as_deref().and_then(|u| url::Url::parse(u).ok()) else {
            return warnings;
        };

        if parsed.scheme() == "http" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Target '{}' uses plain http; TLS handshakes are not part of the measurement", parsed),
            ));
        }

        let is_local = match parsed.host() {
            Some(url::Host::Domain(host)) => host == "localhost",
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        };
        if is_local {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Target '{}' is on this host; the benchmark competes with it for CPU", parsed),
            ));
        }

        if parsed.query().is_some() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Target '{}' includes query parameters, which may affect caching", parsed),
            ));
        }

        warnings
    }

    fn validate_db_target(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let pool_size = config.effective_pool_size();

        if pool_size < config.concurrency {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Pool size {} is below concurrency {}; connection wait time is included in latency",
                    pool_size, config.concurrency
                ),
            ));
        }

        let cpus = num_cpus::get() as u32;
        if pool_size > cpus.saturating_mul(16) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Pool size {} is far above the {} available CPUs; SQLite connections will contend",
                    pool_size, cpus
                ),
            ));
        }

        if config.database_url.as_deref().is_some_and(|u| u.contains(":memory:")) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "In-memory SQLite gives every pooled connection its own empty database",
            ));
        }

        warnings
    }

    fn validate_run_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.loop_count < config.concurrency {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Loop count {} is below concurrency {}; {} workers will stay idle",
                    config.loop_count,
                    config.concurrency,
                    config.concurrency - config.loop_count
                ),
            ));
        }

        if config.loop_count < 30 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Loop count of {} may not provide reliable percentiles (recommended: >= 30)",
                    config.loop_count
                ),
            ));
        }

        if config.request_timeout_seconds > config.deadline_seconds {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Request timeout {}s exceeds the run deadline {}s; slow invocations will be cut off by the deadline",
                    config.request_timeout_seconds, config.deadline_seconds
                ),
            ));
        }

        warnings
    }

    fn validate_diagnostics(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.dump_interval_ms > 0 && config.dump_interval_ms < 100 {
            let per_minute = 60_000 / config.dump_interval_ms;
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Snapshot interval of {}ms writes about {} files per minute",
                    config.dump_interval_ms, per_minute
                ),
            ));
        }

        if config.dump_interval_ms > 0 && !std::path::Path::new(&config.dump_dir).is_dir() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Snapshot directory '{}' does not exist; snapshots will be skipped", config.dump_dir),
            ));
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Blue,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", tag.color(self.level.color()).bold(), self.message)
        } else {
            format!("{} {}", tag, self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(warnings: &[ValidationWarning], needle: &str) -> bool {
        warnings.iter().any(|w| w.message.contains(needle))
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(validate_config(&Config::default()).is_err());
    }

    #[test]
    fn test_reasonable_config_has_no_warnings() {
        let mut config = Config::http("https://example.com/health");
        config.loop_count = 1000;
        config.concurrency = 20;
        assert!(validate_config(&config).unwrap().is_empty());
    }

    #[test]
    fn test_local_http_target() {
        let mut config = Config::http("http://127.0.0.1:8080/?q=1");
        config.loop_count = 100;
        let warnings = validate_config(&config).unwrap();
        assert!(has(&warnings, "is on this host"));
        assert!(has(&warnings, "plain http"));
        assert!(has(&warnings, "query parameters"));
    }

    #[test]
    fn test_small_loop_and_idle_workers() {
        let mut config = Config::http("https://example.com");
        config.loop_count = 5;
        config.concurrency = 8;
        let warnings = validate_config(&config).unwrap();
        assert!(has(&warnings, "3 workers will stay idle"));
        assert!(has(&warnings, "reliable percentiles"));
    }

    #[test]
    fn test_db_pool_below_concurrency() {
        let mut config = Config::db("sqlite://bench.db");
        config.loop_count = 100;
        config.concurrency = 8;
        config.db_pool_size = Some(2);
        let warnings = validate_config(&config).unwrap();
        assert!(has(&warnings, "connection wait time"));
    }

    #[test]
    fn test_in_memory_database() {
        let mut config = Config::db("sqlite::memory:");
        config.loop_count = 100;
        let warnings = validate_config(&config).unwrap();
        assert!(has(&warnings, "In-memory SQLite"));
    }

    #[test]
    fn test_timeout_beyond_deadline() {
        let mut config = Config::http("https://example.com");
        config.loop_count = 100;
        config.deadline_seconds = 5;
        config.request_timeout_seconds = 30;
        let warnings = validate_config(&config).unwrap();
        assert!(has(&warnings, "exceeds the run deadline"));
    }

    #[test]
    fn test_snapshot_settings() {
        let mut config = Config::http("https://example.com");
        config.loop_count = 100;
        config.dump_interval_ms = 10;
        config.dump_dir = "/definitely/not/here".to_string();
        let warnings = validate_config(&config).unwrap();
        assert!(has(&warnings, "6000 files per minute"));
        assert!(has(&warnings, "does not exist"));
    }

    #[test]
    fn test_warning_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "careful");
        assert_eq!(warning.format(false), "[WARNING] careful");
        assert_eq!(ValidationLevel::Info.as_str(), "INFO");
    }
}
