//! Structured logging for the latency benchmark
//!
//! This module provides:
//! - Structured log entries with levels, fields and correlation IDs
//! - Console, JSON and compact output formats
//! - A sampler logger for per-invocation records and run summaries
//! - A factory handing out loggers that share one session ID

use crate::error::AppError;
use crate::models::{Config, RunReport, Sample};
pub use crate::types::LogFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events but application can continue
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    /// Thread name if available
    pub thread_id: Option<String>,
    /// File and line information
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

/// Logger implementation with multiple output formats
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: config.log_format,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// A logger that drops everything below `Error`
    pub fn quiet(name: &str) -> Self {
        let mut logger = Self::new(name.to_string());
        logger.set_level(LogLevel::Error);
        logger
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }

        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = self.render(&entry);

        // Warnings and errors go to stderr so stdout stays the run summary
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields_str: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields_str.sort();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                thread_id: std::thread::current().name().map(String::from),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Attach the fields of one latency sample
    pub fn sample(self, sample: &Sample) -> Self {
        self.field("start_time", sample.start_time)
            .field("duration_ms", sample.duration_ms)
            .field("status", sample.status.as_str())
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for sampler runs: one record per invocation plus run summaries
#[derive(Clone)]
pub struct SamplerLogger {
    logger: Logger,
    run_id: String,
}

impl SamplerLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// A sampler logger that only reports errors
    pub fn quiet() -> Self {
        Self::new(Logger::quiet("SAMPLER"))
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log one completed invocation
    pub async fn log_sample(&self, invocation: u32, sample: &Sample, detail: Option<&str>) {
        if !self.logger.would_log(LogLevel::Debug) {
            return;
        }

        let mut builder = self
            .logger
            .debug(&format!(
                "invocation {} {} in {}ms",
                invocation,
                sample.status,
                sample.duration_ms
            ))
            .correlation_id(&self.run_id)
            .field("invocation", invocation)
            .sample(sample);

        if let Some(detail) = detail {
            builder = builder.field("detail", detail);
        }

        builder.log().await;
    }

    /// Log a failed invocation; the run continues
    pub async fn log_invocation_failure(&self, invocation: u32, error: &AppError) {
        self.logger
            .info(&format!("invocation {} failed: {}", invocation, error))
            .correlation_id(&self.run_id)
            .field("invocation", invocation)
            .error_info(error)
            .log()
            .await;
    }

    /// Log a panic caught inside a task invocation
    pub async fn log_invocation_panic(&self, invocation: u32, message: &str) {
        self.logger
            .warn(&format!("invocation {} panicked: {}", invocation, message))
            .correlation_id(&self.run_id)
            .field("invocation", invocation)
            .log()
            .await;
    }

    /// Log the start of a run
    pub async fn log_run_start(&self, task_name: &str, loop_count: u32, concurrency: u32) {
        self.logger
            .info(&format!(
                "Starting {} run: loop={} concurrency={}",
                task_name, loop_count, concurrency
            ))
            .correlation_id(&self.run_id)
            .field("task", task_name)
            .field("loop", loop_count)
            .field("concurrency", concurrency)
            .log()
            .await;
    }

    /// Log the outcome of a run
    pub async fn log_run_summary(&self, report: &RunReport) {
        let level = if report.timed_out { LogLevel::Warn } else { LogLevel::Info };
        let message = if report.timed_out {
            format!(
                "Deadline reached: {} of {} invocations completed in {:.3}s",
                report.completed(),
                report.submitted,
                report.elapsed.as_secs_f64()
            )
        } else {
            format!(
                "Run completed: {} invocations in {:.3}s",
                report.completed(),
                report.elapsed.as_secs_f64()
            )
        };

        self.logger
            .log(level, &message)
            .correlation_id(&self.run_id)
            .field("submitted", report.submitted)
            .field("completed", report.completed())
            .field("incomplete", report.incomplete)
            .field("failed", report.failed_count())
            .field("elapsed_ms", report.elapsed.as_millis() as u64)
            .log()
            .await;
    }
}

/// Logger for diagnostic snapshot events
#[derive(Clone)]
pub struct DiagnosticsLogger {
    logger: Logger,
}

impl DiagnosticsLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn quiet() -> Self {
        Self::new(Logger::quiet("DIAG"))
    }

    pub async fn log_snapshot_written(&self, path: &std::path::Path, bytes: usize) {
        self.logger
            .debug(&format!("Wrote diagnostic snapshot {}", path.display()))
            .field("path", path.display().to_string())
            .field("bytes", bytes)
            .log()
            .await;
    }

    /// Snapshot failures never interrupt the run, so they stay at debug
    pub async fn log_snapshot_failure(&self, path: &std::path::Path, error: &AppError) {
        self.logger
            .debug(&format!("Failed to write diagnostic snapshot {}: {}", path.display(), error))
            .field("path", path.display().to_string())
            .error_info(error)
            .log()
            .await;
    }
}

/// Logger factory sharing one session ID across components
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger.add_context_field("target".to_string(), self.config.target).await;
        logger
    }

    pub async fn create_sampler_logger(&self) -> SamplerLogger {
        SamplerLogger::new(self.create_logger("SAMPLER").await)
    }

    pub async fn create_diagnostics_logger(&self) -> DiagnosticsLogger {
        DiagnosticsLogger::new(self.create_logger("DIAG").await)
    }
}

/// Convenience macros for logging with location information
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}
