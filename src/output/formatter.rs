//! Core formatting trait and the plain text implementation

use super::RunSummary;
use crate::error::{AppError, Result};
use crate::stats::LatencyStatistics;
use std::fmt::Write as _;
use std::time::Duration;

/// Renders run results for the terminal
pub trait SummaryFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Run parameters, counts and artifact paths
    fn format_run_summary(&self, summary: &RunSummary<'_>) -> Result<String>;

    /// Latency distribution table
    fn format_latency_table(&self, statistics: &LatencyStatistics) -> Result<String>;

    /// Warnings about truncated or fully failed runs; empty when there are none
    fn format_warnings(&self, summary: &RunSummary<'_>) -> Result<String>;

    /// Final `finished in <ms>ms` line
    fn format_finished(&self, elapsed: Duration) -> String;

    /// Format error messages
    fn format_error(&self, error: &AppError) -> String;

    /// Header, summary, table and warnings in one block
    fn format_report(&self, summary: &RunSummary<'_>) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.format_header(&format!("Latency run: {}", summary.task_name))?).map_err(fmt_error)?;
        writeln!(output, "{}", self.format_run_summary(summary)?).map_err(fmt_error)?;
        write!(output, "{}", self.format_latency_table(summary.statistics)?).map_err(fmt_error)?;

        let warnings = self.format_warnings(summary)?;
        if !warnings.is_empty() {
            write!(output, "\n\n{}", warnings).map_err(fmt_error)?;
        }
        Ok(output)
    }
}

/// Formatting options
#[derive(Debug, Clone, Default)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Include throughput, std-dev and outlier rows
    pub verbose_mode: bool,
}

pub(crate) fn fmt_error(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Format duration in human-readable form
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.0}us", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

pub fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.05 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Rows of the latency table: label and value in milliseconds
pub(crate) fn latency_rows(statistics: &LatencyStatistics) -> [(&'static str, f64); 7] {
    [
        ("min", statistics.min_ms),
        ("mean", statistics.mean_ms),
        ("p50", statistics.p50_ms),
        ("p90", statistics.p90_ms),
        ("p95", statistics.p95_ms),
        ("p99", statistics.p99_ms),
        ("max", statistics.max_ms),
    ]
}

/// Plain text formatter for logs and non-terminal output
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }
}

impl SummaryFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_error)?;
        writeln!(output, "  {}  ", title).map_err(fmt_error)?;
        write!(output, "{}", border).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_run_summary(&self, summary: &RunSummary<'_>) -> Result<String> {
        let report = summary.report;
        let stats = summary.statistics;
        let mut output = String::new();

        writeln!(output, "Concurrency:  {}", report.concurrency).map_err(fmt_error)?;
        writeln!(output, "Loop:         {}", report.submitted).map_err(fmt_error)?;
        writeln!(output, "Completed:    {} / {}", report.completed(), report.submitted).map_err(fmt_error)?;
        writeln!(
            output,
            "Successful:   {} ({})",
            stats.successful,
            format_percentage(stats.success_rate)
        )
        .map_err(fmt_error)?;
        writeln!(output, "Failed:       {} ({} timeouts)", stats.failed, stats.timed_out).map_err(fmt_error)?;

        if self.options.verbose_mode {
            writeln!(output, "Throughput:   {:.1}/s", stats.throughput_per_sec).map_err(fmt_error)?;
            writeln!(output, "Outliers:     {}", stats.outliers).map_err(fmt_error)?;
        }
        if summary.snapshots_written > 0 {
            writeln!(output, "Snapshots:    {}", summary.snapshots_written).map_err(fmt_error)?;
        }
        if let Some(chart) = summary.chart_path {
            writeln!(output, "Chart:        {}", chart.display()).map_err(fmt_error)?;
        }
        if let Some(csv) = summary.csv_path {
            writeln!(output, "Samples CSV:  {}", csv.display()).map_err(fmt_error)?;
        }

        Ok(output)
    }

    fn format_latency_table(&self, statistics: &LatencyStatistics) -> Result<String> {
        if statistics.total == 0 {
            return Ok("No samples recorded.".to_string());
        }

        let mut output = String::new();
        writeln!(output, "Latency:").map_err(fmt_error)?;
        for (label, value) in latency_rows(statistics) {
            writeln!(output, "  {:<6} {:>10}", label, format_duration(value)).map_err(fmt_error)?;
        }
        if self.options.verbose_mode {
            writeln!(output, "  {:<6} {:>10}", "stddev", format_duration(statistics.std_dev_ms)).map_err(fmt_error)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_warnings(&self, summary: &RunSummary<'_>) -> Result<String> {
        let mut output = String::new();

        if summary.report.timed_out {
            writeln!(
                output,
                "WARNING: deadline reached, {} of {} invocations did not complete",
                summary.report.incomplete, summary.report.submitted
            )
            .map_err(fmt_error)?;
        }
        if summary.statistics.all_failed() {
            writeln!(output, "WARNING: every recorded invocation failed").map_err(fmt_error)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_finished(&self, elapsed: Duration) -> String {
        format!("finished in {}ms", elapsed.as_millis())
    }

    fn format_error(&self, error: &AppError) -> String {
        format!("Error: {}", error)
    }
}
