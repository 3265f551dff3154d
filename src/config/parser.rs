//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};
use std::path::Path;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        if self.cli.debug {
            if let Some(warnings) = EnvManager::check_env_file(Path::new(".env"))? {
                for warning in warnings {
                    println!("Warning: .env {}", warning);
                }
            }
        }

        EnvManager::load_env_file(self.cli.debug)?;

        if self.cli.debug {
            for warning in EnvManager::validate_current_env() {
                println!("{}", warning);
            }
        }

        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(target) = cli.target {
            config.target = target;
        }
        if let Some(ref url) = cli.url {
            config.url = Some(url.clone());
        }
        if let Some(ref database_url) = cli.database_url {
            config.database_url = Some(database_url.clone());
        }
        if let Some(ref key) = cli.key {
            config.lookup_key = key.clone();
        }
        if let Some(ref query) = cli.query {
            config.lookup_query = query.clone();
        }
        if let Some(loop_count) = cli.loop_count {
            config.loop_count = loop_count;
        }
        if let Some(concurrency) = cli.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(interval) = cli.dump_interval {
            config.dump_interval_ms = interval;
        }
        if let Some(deadline) = cli.deadline {
            config.deadline_seconds = deadline;
        }
        if let Some(timeout) = cli.timeout {
            config.request_timeout_seconds = timeout;
        }
        if let Some(pool_size) = cli.pool_size {
            config.db_pool_size = Some(pool_size);
        }
        if let Some(ref chart) = cli.chart {
            config.chart_path = chart.clone();
        }
        if let Some(ref csv) = cli.csv {
            config.csv_path = Some(csv.clone());
        }
        if let Some(ref dump_dir) = cli.dump_dir {
            config.dump_dir = dump_dir.clone();
        }

        if cli.db_init {
            config.db_init = true;
        }
        if cli.color {
            config.enable_color = true;
        }
        if cli.no_color {
            config.enable_color = false;
        }
        if let Some(format) = cli.log_format {
            config.log_format = format;
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            println!("Applied CLI overrides to configuration");
            println!("{}", display_config_summary(config));
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Target: {}", config.target));
    match config.target {
        crate::types::TargetKind::Http => {
            summary.push(format!("URL: {}", config.url.as_deref().unwrap_or("<unset>")));
        }
        crate::types::TargetKind::Db => {
            summary.push(format!("Database: {}", config.database_url.as_deref().unwrap_or("<unset>")));
            summary.push(format!("Lookup: {} [{}]", config.lookup_query, config.lookup_key));
            summary.push(format!("Pool Size: {}", config.effective_pool_size()));
        }
    }
    summary.push(format!("Loop: {}", config.loop_count));
    summary.push(format!("Concurrency: {}", config.concurrency));
    summary.push(format!("Deadline: {}s", config.deadline_seconds));
    summary.push(format!("Timeout: {}s", config.request_timeout_seconds));
    summary.push(format!("Dump Interval: {}ms", config.dump_interval_ms));
    summary.push(format!("Chart: {}", config.chart_path));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Log Format: {}", config.log_format));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
