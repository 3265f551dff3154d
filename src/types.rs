//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Which external operation each invocation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// One HTTP GET against the configured URL
    Http,
    /// One keyed point lookup against the configured database
    Db,
}

impl TargetKind {
    /// Get a human-readable name for this target
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::Http => "HTTP GET",
            TargetKind::Db => "DB lookup",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Http => "http",
            TargetKind::Db => "db",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "http" | "https" | "get" => Ok(TargetKind::Http),
            "db" | "database" | "sql" => Ok(TargetKind::Db),
            other => Err(AppError::parse(format!(
                "Invalid target '{}': expected 'http' or 'db'",
                other
            ))),
        }
    }
}

/// Outcome of a single task invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationStatus {
    /// Task returned normally
    Success,
    /// Task returned an error or panicked
    Failed,
    /// Task reported a timeout (request or pool acquire)
    Timeout,
}

impl InvocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationStatus::Success => "success",
            InvocationStatus::Failed => "failed",
            InvocationStatus::Timeout => "timeout",
        }
    }

    /// Classify a task error
    pub fn from_error(error: &AppError) -> Self {
        match error {
            AppError::Timeout(_) => InvocationStatus::Timeout,
            _ => InvocationStatus::Failed,
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How log entries are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format
    #[default]
    Console,
    /// One JSON object per entry
    Json,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Console => "console",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" | "text" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(AppError::parse(format!(
                "Invalid log format '{}': expected 'console', 'json' or 'compact'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind_parsing() {
        assert_eq!("http".parse::<TargetKind>().unwrap(), TargetKind::Http);
        assert_eq!("DB".parse::<TargetKind>().unwrap(), TargetKind::Db);
        assert_eq!(" database ".parse::<TargetKind>().unwrap(), TargetKind::Db);
        assert!("ftp".parse::<TargetKind>().is_err());
    }

    #[test]
    fn test_target_kind_display_round_trips() {
        for kind in [TargetKind::Http, TargetKind::Db] {
            assert_eq!(kind.to_string().parse::<TargetKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_status_from_error() {
        assert_eq!(
            InvocationStatus::from_error(&AppError::timeout("slow")),
            InvocationStatus::Timeout
        );
        assert_eq!(
            InvocationStatus::from_error(&AppError::not_found("1234")),
            InvocationStatus::Failed
        );
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Console);
        assert_eq!(" compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default(), LogFormat::Console);
    }
}
