//! Command-line interface module with topic help

pub mod help;

pub use help::HelpSystem;

use crate::types::{LogFormat, TargetKind};
use clap::Parser;
use std::path::PathBuf;

/// Pool Latency Bench - measure per-invocation latency through a bounded worker pool
///
/// Options left unset fall back to environment variables, then to `.env`,
/// then to built-in defaults.
#[derive(Parser, Debug, Clone)]
#[command(name = "plb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Operation each invocation performs: http or db
    #[arg(long, value_parser = parse_target)]
    pub target: Option<TargetKind>,

    /// URL requested by the HTTP target
    #[arg(long)]
    pub url: Option<String>,

    /// SQLite database URL for the DB target
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Key bound into the lookup query
    #[arg(long)]
    pub key: Option<String>,

    /// Lookup query with a single '?' placeholder
    #[arg(long, value_name = "SQL")]
    pub query: Option<String>,

    /// Total number of invocations
    #[arg(short = 'n', long = "loop", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub loop_count: Option<u32>,

    /// Worker pool size
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: Option<u32>,

    /// Diagnostic snapshot interval in milliseconds (0 disables)
    #[arg(long, value_name = "MS")]
    pub dump_interval: Option<u64>,

    /// Maximum seconds to wait for the run to drain
    #[arg(long, value_name = "SECONDS", value_parser = parse_deadline)]
    pub deadline: Option<u64>,

    /// Per-invocation timeout in seconds
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Database pool size (defaults to the concurrency)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pool_size: Option<u32>,

    /// Where the latency chart is written
    #[arg(long, value_name = "PATH")]
    pub chart: Option<String>,

    /// Also export every sample as CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<String>,

    /// Directory receiving diagnostic snapshots
    #[arg(long, value_name = "DIR")]
    pub dump_dir: Option<String>,

    /// Create the lookup table and key row before the run
    #[arg(long)]
    pub db_init: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub env_example: Option<PathBuf>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log entry format: console, json or compact
    #[arg(long, value_name = "FORMAT", value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Show help for specific topic (config, env, targets, diagnostics, examples, output)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.db_init && self.target == Some(TargetKind::Http) {
            return Err("--db-init only applies to --target db".to_string());
        }

        if let Some(ref query) = self.query {
            if query.matches('?').count() != 1 {
                return Err("--query must contain exactly one '?' placeholder".to_string());
            }
        }

        Ok(())
    }

    /// Check if help should be displayed for a specific topic
    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        match &self.help_topic {
            Some(topic) => help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    HelpSystem::TOPICS.join(", "),
                    help_system.display_main_help(use_colors)
                )
            }),
            None => help_system.display_main_help(use_colors),
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line Overrides:\n");
        if let Some(target) = self.target {
            summary.push_str(&format!("  Target: {}\n", target));
        }
        if let Some(ref url) = self.url {
            summary.push_str(&format!("  URL: {}\n", url));
        }
        if let Some(ref database_url) = self.database_url {
            summary.push_str(&format!("  Database: {}\n", database_url));
        }
        if let Some(loop_count) = self.loop_count {
            summary.push_str(&format!("  Loop: {}\n", loop_count));
        }
        if let Some(concurrency) = self.concurrency {
            summary.push_str(&format!("  Concurrency: {}\n", concurrency));
        }
        if let Some(interval) = self.dump_interval {
            summary.push_str(&format!("  Dump interval: {}ms\n", interval));
        }
        if let Some(timeout) = self.timeout {
            summary.push_str(&format!("  Timeout: {}s\n", timeout));
        }
        if let Some(format) = self.log_format {
            summary.push_str(&format!("  Log format: {}\n", format));
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

fn parse_target(s: &str) -> Result<TargetKind, String> {
    s.parse::<TargetKind>().map_err(|e| e.to_string())
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse::<LogFormat>().map_err(|e| e.to_string())
}

fn parse_bounded_secs(s: &str, max: u64) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > max {
                Err(format!("Duration cannot exceed {} seconds", max))
            } else {
                Ok(secs)
            }
        })
}

/// Parse the per-invocation timeout in seconds
fn parse_duration(s: &str) -> Result<u64, String> {
    parse_bounded_secs(s, crate::defaults::MAX_REQUEST_TIMEOUT_SECS)
}

fn parse_deadline(s: &str) -> Result<u64, String> {
    parse_bounded_secs(s, crate::defaults::MAX_DEADLINE_SECS)
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_defaults_are_unset() {
        let cli = Cli::parse_from(["test"]);
        assert!(cli.target.is_none());
        assert!(cli.loop_count.is_none());
        assert!(cli.concurrency.is_none());
        assert!(!cli.db_init);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "test",
            "--target", "db",
            "--database-url", "sqlite://bench.db",
            "--key", "42",
            "--query", "SELECT v FROM kv WHERE k = ?",
            "-n", "1000",
            "-c", "50",
            "--dump-interval", "250",
            "--deadline", "60",
            "-t", "5",
            "--pool-size", "8",
            "--chart", "out.svg",
            "--csv", "out.csv",
            "--dump-dir", "/tmp",
            "--db-init",
            "--log-format", "json",
            "--no-color",
            "--verbose",
            "--debug",
        ]);

        assert_eq!(cli.target, Some(TargetKind::Db));
        assert_eq!(cli.database_url.as_deref(), Some("sqlite://bench.db"));
        assert_eq!(cli.key.as_deref(), Some("42"));
        assert_eq!(cli.loop_count, Some(1000));
        assert_eq!(cli.concurrency, Some(50));
        assert_eq!(cli.dump_interval, Some(250));
        assert_eq!(cli.deadline, Some(60));
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.pool_size, Some(8));
        assert_eq!(cli.chart.as_deref(), Some("out.svg"));
        assert_eq!(cli.csv.as_deref(), Some("out.csv"));
        assert_eq!(cli.dump_dir.as_deref(), Some("/tmp"));
        assert!(cli.db_init);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.no_color);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_zero_loop_and_concurrency_rejected() {
        assert!(Cli::try_parse_from(["test", "--loop", "0"]).is_err());
        assert!(Cli::try_parse_from(["test", "-c", "0"]).is_err());
        assert!(Cli::try_parse_from(["test", "--target", "ftp"]).is_err());
        assert!(Cli::try_parse_from(["test", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("10").unwrap(), 10);
        assert_eq!(parse_duration("300").unwrap(), 300);
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("301").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("+10").is_err());
        assert!(parse_duration("0x10").is_err());
        assert!(parse_duration("-5").is_err());

        assert_eq!(parse_deadline("3600").unwrap(), 3600);
        assert!(parse_deadline("86401").is_err());
    }

    #[test]
    fn test_cli_validation() {
        let cli = Cli::parse_from(["test", "--color", "--no-color"]);
        assert!(cli.validate().unwrap_err().contains("--color and --no-color"));

        let cli = Cli::parse_from(["test", "--target", "http", "--db-init"]);
        assert!(cli.validate().unwrap_err().contains("--db-init"));

        let cli = Cli::parse_from(["test", "--query", "SELECT 1"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["test", "--url", "https://example.com"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_use_colors_method() {
        assert!(!Cli::parse_from(["test", "--no-color"]).use_colors());
        assert!(Cli::parse_from(["test", "--color"]).use_colors());
    }

    #[test]
    fn test_help_display() {
        let cli = Cli::parse_from(["test", "--no-color"]);
        let help = cli.display_help();
        assert!(help.contains("Pool Latency Bench"));
        assert!(help.contains("USAGE:"));

        let cli = Cli::parse_from(["test", "--no-color", "--help-topic", "config"]);
        assert!(cli.should_show_topic_help());
        assert!(cli.display_help().contains("CONFIGURATION REFERENCE"));

        let cli = Cli::parse_from(["test", "--no-color", "--help-topic", "bogus"]);
        let help = cli.display_help();
        assert!(help.contains("Unknown help topic: 'bogus'"));
        assert!(help.contains("Available topics:"));
    }

    #[test]
    fn test_config_summary() {
        let cli = Cli::parse_from(["test", "--no-color", "--loop", "5", "-c", "2", "--url", "https://test.com"]);
        let summary = cli.get_config_summary();
        assert!(summary.contains("Loop: 5"));
        assert!(summary.contains("Concurrency: 2"));
        assert!(summary.contains("URL: https://test.com"));
        assert!(summary.contains("Colored output: false"));
    }

    #[test]
    fn test_color_support_detection() {
        std::env::set_var("NO_COLOR", "1");
        assert!(!supports_color());
        std::env::remove_var("NO_COLOR");
    }
}
