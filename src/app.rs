//! Harness orchestration: build the task, run the sampler, write the chart

use crate::{
    config::{display_config_summary, validate_config},
    diagnostics::{SnapshotWriter, Snapshotter},
    error::Result,
    log_debug, log_info, log_warn,
    logging::{Logger, LoggerFactory},
    models::{Config, RunReport},
    output::{chart::LatencyChart, csv::write_samples_csv, OutputFormatterFactory, RunSummary},
    sampler::Sampler,
    stats::LatencyStatistics,
    task::TaskFactory,
};
use std::path::PathBuf;
use std::time::Instant;

/// Everything one harness run produced
#[derive(Debug, Clone)]
pub struct HarnessOutcome {
    pub task_name: String,
    pub report: RunReport,
    pub statistics: LatencyStatistics,
    pub chart_path: PathBuf,
    pub csv_path: Option<PathBuf>,
    pub snapshots_written: usize,
}

impl HarnessOutcome {
    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary {
            task_name: &self.task_name,
            report: &self.report,
            statistics: &self.statistics,
            chart_path: Some(self.chart_path.as_path()),
            csv_path: self.csv_path.as_deref(),
            snapshots_written: self.snapshots_written,
        }
    }
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    loggers: LoggerFactory,
}

impl App {
    pub fn new(config: Config) -> Self {
        let loggers = LoggerFactory::new(config.clone());
        Self { config, loggers }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute the run and print the summary, ending with `finished in <ms>ms`
    pub async fn run(&self) -> Result<HarnessOutcome> {
        let started = Instant::now();
        let formatter = OutputFormatterFactory::create_formatter(self.config.enable_color, self.config.verbose);

        let warnings = validate_config(&self.config)?;
        if !warnings.is_empty() && (self.config.verbose || self.config.debug) {
            println!("Configuration Warnings:");
            for warning in &warnings {
                println!("  {}", warning.format(self.config.enable_color));
            }
            println!();
        }

        let outcome = self.execute().await?;

        println!("{}", formatter.format_report(&outcome.summary())?);
        println!();
        println!("{}", formatter.format_finished(started.elapsed()));

        Ok(outcome)
    }

    /// Run the sampler and write the artifacts without printing a summary
    pub async fn execute(&self) -> Result<HarnessOutcome> {
        let config = &self.config;
        let logger = self.loggers.create_logger("HARNESS").await;
        let run = config.run_config();

        log_debug!(logger, "Configuration:\n{}", display_config_summary(config));

        let task = TaskFactory::create(config).await?;
        let task_name = task.name().to_string();
        log_info!(
            logger,
            "Running '{}' {} times with {} workers",
            task_name,
            run.loop_count,
            run.concurrency
        );

        let sampler = Sampler::with_logger(self.loggers.create_sampler_logger().await);

        let snapshotter = if run.dump_enabled() {
            let writer = SnapshotWriter::with_logger(
                &config.dump_dir,
                sampler.registry(),
                self.loggers.create_diagnostics_logger().await,
            );
            Some(Snapshotter::start(writer, run.dump_interval))
        } else {
            None
        };

        let result = sampler
            .submit_run(task, run.loop_count, run.concurrency, config.deadline())
            .await;

        let snapshots_written = match snapshotter {
            Some(snapshotter) => snapshotter.stop().await,
            None => 0,
        };
        let report = result?;

        if report.timed_out {
            log_warn!(
                logger,
                "Deadline of {}s reached with {} invocations outstanding",
                config.deadline_seconds,
                report.incomplete
            );
        }

        let statistics = LatencyStatistics::from_report(&report);
        let (chart_path, csv_path) = self.write_artifacts(&logger, &task_name, &report).await?;

        Ok(HarnessOutcome {
            task_name,
            report,
            statistics,
            chart_path,
            csv_path,
            snapshots_written,
        })
    }

    async fn write_artifacts(
        &self,
        logger: &Logger,
        task_name: &str,
        report: &RunReport,
    ) -> Result<(PathBuf, Option<PathBuf>)> {
        let run = self.config.run_config();

        let chart_path = PathBuf::from(&self.config.chart_path);
        LatencyChart::new(task_name, run.concurrency, run.loop_count).write(&chart_path, &report.samples)?;
        log_debug!(logger, "Chart written to {}", chart_path.display());

        let csv_path = match self.config.csv_path.as_deref() {
            Some(path) => {
                let path = PathBuf::from(path);
                write_samples_csv(&path, &report.samples)?;
                log_debug!(logger, "Samples written to {}", path.display());
                Some(path)
            }
            None => None,
        };

        Ok((chart_path, csv_path))
    }
}
