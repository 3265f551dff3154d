//! Run output: latency chart, sample export and terminal summary

pub mod chart;
mod colored;
pub mod csv;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use chart::LatencyChart;
pub use csv::write_samples_csv;
pub use formatter::{format_duration, format_percentage, FormattingOptions, PlainFormatter, SummaryFormatter};

use crate::models::RunReport;
use crate::stats::LatencyStatistics;
use std::path::Path;

/// Everything the summary formatter needs about one finished run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'a> {
    pub task_name: &'a str,
    pub report: &'a RunReport,
    pub statistics: &'a LatencyStatistics,
    pub chart_path: Option<&'a Path>,
    pub csv_path: Option<&'a Path>,
    pub snapshots_written: usize,
}

impl<'a> RunSummary<'a> {
    pub fn new(task_name: &'a str, report: &'a RunReport, statistics: &'a LatencyStatistics) -> Self {
        Self {
            task_name,
            report,
            statistics,
            chart_path: None,
            csv_path: None,
            snapshots_written: 0,
        }
    }
}

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn SummaryFormatter + Send + Sync> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }
}
