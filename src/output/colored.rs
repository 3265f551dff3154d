//! Colored formatter for terminals with ANSI support

use super::formatter::{fmt_error, format_duration, format_percentage, latency_rows, FormattingOptions, SummaryFormatter};
use super::RunSummary;
use crate::error::{AppError, Result};
use crate::stats::LatencyStatistics;
use colored::*;
use std::fmt::Write as _;
use std::time::Duration;

/// Latency classification used for color coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Excellent, // < 10ms
    Good,      // 10-50ms
    Fair,      // 50-200ms
    Poor,      // 200-1000ms
    VeryPoor,  // > 1000ms
}

impl PerformanceLevel {
    pub fn from_latency(latency_ms: f64) -> Self {
        if latency_ms < 10.0 {
            Self::Excellent
        } else if latency_ms < 50.0 {
            Self::Good
        } else if latency_ms < 200.0 {
            Self::Fair
        } else if latency_ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

/// Formatter that colors counts, rates and latencies
pub struct ColoredFormatter {
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            color_scheme: ColorScheme::default(),
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn format_latency_colored(&self, latency_ms: f64) -> ColoredString {
        let level = PerformanceLevel::from_latency(latency_ms);
        self.colorize(&format_duration(latency_ms), level.color())
    }

    fn format_percentage_colored(&self, percentage: f64) -> ColoredString {
        let color = if percentage >= 99.0 {
            self.color_scheme.success
        } else if percentage >= 90.0 {
            self.color_scheme.warning
        } else {
            self.color_scheme.error
        };
        self.colorize(&format_percentage(percentage), color)
    }

    fn label(&self, text: &str) -> ColoredString {
        self.colorize(text, self.color_scheme.muted)
    }
}

impl SummaryFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.muted)).map_err(fmt_error)?;
        writeln!(output, "  {}  ", self.bold(title).color(self.color_scheme.header)).map_err(fmt_error)?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.muted)).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_run_summary(&self, summary: &RunSummary<'_>) -> Result<String> {
        let report = summary.report;
        let stats = summary.statistics;
        let mut output = String::new();

        writeln!(
            output,
            "{} {}",
            self.label("Concurrency: "),
            self.colorize(&report.concurrency.to_string(), self.color_scheme.info)
        )
        .map_err(fmt_error)?;
        writeln!(
            output,
            "{} {}",
            self.label("Loop:        "),
            self.colorize(&report.submitted.to_string(), self.color_scheme.info)
        )
        .map_err(fmt_error)?;

        let completed = format!("{} / {}", report.completed(), report.submitted);
        let completed_color = if report.is_complete() {
            self.color_scheme.success
        } else {
            self.color_scheme.warning
        };
        writeln!(output, "{} {}", self.label("Completed:   "), self.colorize(&completed, completed_color))
            .map_err(fmt_error)?;
        writeln!(
            output,
            "{} {} ({})",
            self.label("Successful:  "),
            self.colorize(&stats.successful.to_string(), self.color_scheme.success),
            self.format_percentage_colored(stats.success_rate)
        )
        .map_err(fmt_error)?;

        let failed_color = if stats.failed == 0 {
            self.color_scheme.muted
        } else {
            self.color_scheme.error
        };
        writeln!(
            output,
            "{} {} ({} timeouts)",
            self.label("Failed:      "),
            self.colorize(&stats.failed.to_string(), failed_color),
            stats.timed_out
        )
        .map_err(fmt_error)?;

        if self.options.verbose_mode {
            writeln!(output, "{} {:.1}/s", self.label("Throughput:  "), stats.throughput_per_sec).map_err(fmt_error)?;
            writeln!(output, "{} {}", self.label("Outliers:    "), stats.outliers).map_err(fmt_error)?;
        }
        if summary.snapshots_written > 0 {
            writeln!(output, "{} {}", self.label("Snapshots:   "), summary.snapshots_written).map_err(fmt_error)?;
        }
        if let Some(chart) = summary.chart_path {
            writeln!(
                output,
                "{} {}",
                self.label("Chart:       "),
                self.bold(&chart.display().to_string())
            )
            .map_err(fmt_error)?;
        }
        if let Some(csv) = summary.csv_path {
            writeln!(output, "{} {}", self.label("Samples CSV: "), csv.display()).map_err(fmt_error)?;
        }

        Ok(output)
    }

    fn format_latency_table(&self, statistics: &LatencyStatistics) -> Result<String> {
        if statistics.total == 0 {
            return Ok(self
                .colorize("No samples recorded.", self.color_scheme.warning)
                .to_string());
        }

        let mut output = String::new();
        writeln!(output, "{}", self.bold("Latency:")).map_err(fmt_error)?;
        for (label, value) in latency_rows(statistics) {
            // Pad before coloring so escape codes don't break alignment
            let cell = format!("{:>10}", format_duration(value));
            let level = PerformanceLevel::from_latency(value);
            writeln!(output, "  {:<6} {}", label, self.colorize(&cell, level.color())).map_err(fmt_error)?;
        }
        if self.options.verbose_mode {
            writeln!(
                output,
                "  {:<6} {}",
                "stddev",
                self.colorize(&format!("{:>10}", format_duration(statistics.std_dev_ms)), self.color_scheme.muted)
            )
            .map_err(fmt_error)?;
            writeln!(
                output,
                "  {:<6} {} ({})",
                "p50",
                self.format_latency_colored(statistics.p50_ms),
                PerformanceLevel::from_latency(statistics.p50_ms).description()
            )
            .map_err(fmt_error)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_warnings(&self, summary: &RunSummary<'_>) -> Result<String> {
        let mut output = String::new();

        if summary.report.timed_out {
            let line = format!(
                "WARNING: deadline reached, {} of {} invocations did not complete",
                summary.report.incomplete, summary.report.submitted
            );
            writeln!(output, "{}", self.colorize(&line, self.color_scheme.warning)).map_err(fmt_error)?;
        }
        if summary.statistics.all_failed() {
            writeln!(
                output,
                "{}",
                self.colorize("WARNING: every recorded invocation failed", self.color_scheme.error)
            )
            .map_err(fmt_error)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_finished(&self, elapsed: Duration) -> String {
        self.bold(&format!("finished in {}ms", elapsed.as_millis())).to_string()
    }

    fn format_error(&self, error: &AppError) -> String {
        format!(
            "{} {}",
            self.colorize("Error:", self.color_scheme.error).bold(),
            error
        )
    }
}
