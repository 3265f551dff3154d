//! Topic-based command-line help with examples

use crate::config::env::EnvManager;
use crate::defaults;
use colored::*;

/// Help system for the CLI application
pub struct HelpSystem {
    platform: String,
}

impl HelpSystem {
    /// Topics accepted by `--help-topic`
    pub const TOPICS: [&'static str; 6] = ["config", "env", "targets", "diagnostics", "examples", "output"];

    pub fn new() -> Self {
        Self {
            platform: platform_name(),
        }
    }

    /// Display the main help message with all available options
    pub fn display_main_help(&self, use_colors: bool) -> String {
        let mut help = String::new();

        help.push_str(&self.format_header(use_colors));
        help.push('\n');
        help.push_str(&self.format_usage_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_options_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_examples_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_footer(use_colors));

        help
    }

    /// Display help for a single topic
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" => Some(self.format_configuration_help(use_colors)),
            "env" | "environment" => Some(self.format_environment_help(use_colors)),
            "targets" | "target" => Some(self.format_targets_help(use_colors)),
            "diagnostics" | "dump" => Some(self.format_diagnostics_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            "output" | "chart" => Some(self.format_output_help(use_colors)),
            _ => None,
        }
    }

    fn section(title: &str, use_colors: bool) -> String {
        if use_colors {
            title.bright_green().bold().to_string()
        } else {
            title.to_string()
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Pool Latency Bench";
        let subtitle = crate::PKG_DESCRIPTION;
        let version = crate::VERSION;

        if use_colors {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!("{}\n{}\nVersion: {} | Platform: {}\n", title, subtitle, version, self.platform)
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let patterns = [
            "plb --url <URL> [OPTIONS]",
            "plb --target db --database-url <URL> [OPTIONS]",
            "plb --help-topic <TOPIC>",
        ];

        let mut usage = format!("{}\n", Self::section("USAGE:", use_colors));
        for pattern in patterns {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }
        usage
    }

    fn format_options_section(&self, use_colors: bool) -> String {
        let options = [
            OptionHelp {
                short: None,
                long: "target",
                value: "<http|db>",
                description: "Operation each invocation performs",
                example: Some("--target db"),
            },
            OptionHelp {
                short: None,
                long: "url",
                value: "<URL>",
                description: "URL requested by the HTTP target",
                example: Some("--url http://localhost:8080/health"),
            },
            OptionHelp {
                short: None,
                long: "database-url",
                value: "<URL>",
                description: "SQLite database for the DB target",
                example: Some("--database-url sqlite://bench.db"),
            },
            OptionHelp {
                short: Some("n"),
                long: "loop",
                value: "<N>",
                description: "Total number of invocations",
                example: Some("--loop 10000"),
            },
            OptionHelp {
                short: Some("c"),
                long: "concurrency",
                value: "<N>",
                description: "Worker pool size",
                example: Some("--concurrency 50"),
            },
            OptionHelp {
                short: None,
                long: "dump-interval",
                value: "<MS>",
                description: "Diagnostic snapshot interval, 0 disables",
                example: Some("--dump-interval 500"),
            },
            OptionHelp {
                short: None,
                long: "deadline",
                value: "<SECONDS>",
                description: "Maximum wait for the run to drain",
                example: None,
            },
            OptionHelp {
                short: Some("t"),
                long: "timeout",
                value: "<SECONDS>",
                description: "Per-invocation timeout (1-300)",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "chart",
                value: "<PATH>",
                description: "Where the latency chart is written",
                example: Some("--chart run-50.svg"),
            },
            OptionHelp {
                short: None,
                long: "csv",
                value: "<PATH>",
                description: "Also export every sample as CSV",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "db-init",
                value: "",
                description: "Create the lookup table and key row first",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "verbose",
                value: "",
                description: "Show throughput, std-dev and outliers",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "log-format",
                value: "<console|json|compact>",
                description: "Rendering of log entries",
                example: Some("--log-format json"),
            },
            OptionHelp {
                short: None,
                long: "no-color",
                value: "",
                description: "Disable colored output",
                example: None,
            },
        ];

        let mut output = format!("{}\n", Self::section("OPTIONS:", use_colors));
        for option in options {
            output.push_str(&option.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ExampleHelp {
                title: "HTTP GET latency",
                command: "plb --url http://localhost:8080/health --loop 1000 --concurrency 50",
                description: "1000 requests through a pool of 50 workers",
            },
            ExampleHelp {
                title: "Database point lookup",
                command: "plb --target db --database-url sqlite://bench.db --db-init --loop 10000 -c 32",
                description: "Create the fixture row, then run 10000 lookups with 32 workers",
            },
            ExampleHelp {
                title: "Snapshots while running",
                command: "plb --url http://localhost:8080/ --dump-interval 500 --dump-dir /tmp/dumps",
                description: "Write a worker and thread snapshot every 500ms",
            },
            ExampleHelp {
                title: "Compare pool sizes",
                command: "for c in 1 10 50; do plb --url http://localhost:8080/ -c $c --chart run-$c.svg; done",
                description: "One chart per concurrency level; each legend names its parameters",
            },
        ];

        let mut output = format!("{}\n", Self::section("EXAMPLES:", use_colors));
        for example in examples {
            output.push_str(&example.format(use_colors));
            output.push('\n');
        }
        output
    }

    fn format_footer(&self, use_colors: bool) -> String {
        let mut footer = format!("{}\n", Self::section("ADDITIONAL HELP:", use_colors));
        for topic in Self::TOPICS {
            let command = format!("--help-topic {}", topic);
            if use_colors {
                footer.push_str(&format!("  {}\n", command.bright_yellow()));
            } else {
                footer.push_str(&format!("  {}\n", command));
            }
        }
        footer
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", Self::section("CONFIGURATION REFERENCE:", use_colors));

        help.push_str("CONFIGURATION PRIORITY (highest to lowest):\n");
        help.push_str("1. Command-line arguments\n");
        help.push_str("2. Environment variables\n");
        help.push_str("3. .env file values\n");
        help.push_str("4. Default values\n\n");

        help.push_str("PARAMETER LIMITS:\n");
        help.push_str(&format!("- Loop: 1-{} invocations (default {})\n", defaults::MAX_LOOP, defaults::DEFAULT_LOOP));
        help.push_str(&format!(
            "- Concurrency: 1-{} workers (default {})\n",
            defaults::MAX_CONCURRENCY,
            defaults::DEFAULT_CONCURRENCY
        ));
        help.push_str(&format!(
            "- Deadline: 1-{} seconds (default {})\n",
            defaults::MAX_DEADLINE_SECS,
            defaults::DEFAULT_DEADLINE.as_secs()
        ));
        help.push_str(&format!(
            "- Timeout: 1-{} seconds (default {})\n",
            defaults::MAX_REQUEST_TIMEOUT_SECS,
            defaults::DEFAULT_REQUEST_TIMEOUT.as_secs()
        ));
        help.push_str("- Database pool size: defaults to the concurrency\n");

        help
    }

    fn format_environment_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", Self::section("ENVIRONMENT VARIABLES:", use_colors));

        for (var_name, description, example) in EnvManager::get_supported_env_vars() {
            if use_colors {
                help.push_str(&format!("  {}: {}\n", var_name.bright_yellow().bold(), description));
            } else {
                help.push_str(&format!("  {}: {}\n", var_name, description));
            }
            help.push_str(&format!("    e.g. {}={}\n", var_name, example));
        }

        help.push_str("\nPriority: command line, then environment, then .env, then defaults.\n");
        help.push_str("A .env file in the working directory is loaded when present.\n");
        help.push_str("Use --env-example <PATH> to write a commented template.\n");
        help
    }

    fn format_targets_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", Self::section("TARGETS:", use_colors));

        help.push_str("http  One GET request per invocation against --url.\n");
        help.push_str("      Status codes of 400 and above count as failures.\n");
        help.push_str("      The client keeps up to --concurrency idle connections.\n\n");
        help.push_str("db    One point lookup per invocation through a SQLite pool.\n");
        help.push_str(&format!(
            "      Default query: {} with key {}.\n",
            defaults::DEFAULT_LOOKUP_QUERY,
            defaults::DEFAULT_LOOKUP_KEY
        ));
        help.push_str("      A missing row counts as a failure; --db-init creates it.\n");
        help
    }

    fn format_diagnostics_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", Self::section("DIAGNOSTIC SNAPSHOTS:", use_colors));

        help.push_str("With --dump-interval greater than 0, a snapshot file named\n");
        help.push_str("thread<yyMMdd-HHmmss.SSS>.txt is written to --dump-dir at that\n");
        help.push_str("interval while the run is active. Each file lists the state of\n");
        help.push_str("every worker and, on Linux, the threads of this process.\n");
        help.push_str("A failed write is logged and the run continues.\n");
        help
    }

    fn format_output_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", Self::section("OUTPUT:", use_colors));

        help.push_str("- An SVG scatter chart of latency over time, one point per\n");
        help.push_str("  invocation; the legend shows the concurrency and loop count\n");
        help.push_str("- A summary with completed, failed and timed-out counts\n");
        help.push_str("- min, mean, p50, p90, p95, p99 and max latency\n");
        help.push_str("- A closing 'finished in <ms>ms' line\n\n");
        help.push_str("Exit codes: 0 success, 1 configuration, 2 network, 3 timeout,\n");
        help.push_str("4 database, 5 file output, 6 every invocation failed.\n");
        help
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn platform_name() -> String {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    }
    .to_string()
}

/// Helper struct for formatting individual options
struct OptionHelp {
    short: Option<&'static str>,
    long: &'static str,
    value: &'static str,
    description: &'static str,
    example: Option<&'static str>,
}

impl OptionHelp {
    fn format(&self, use_colors: bool) -> String {
        let mut option_str = String::new();

        if let Some(short) = self.short {
            if use_colors {
                option_str.push_str(&format!("  {}, ", format!("-{}", short).bright_cyan()));
            } else {
                option_str.push_str(&format!("  -{}, ", short));
            }
        } else {
            option_str.push_str("      ");
        }

        let long_with_value = if self.value.is_empty() {
            format!("--{}", self.long)
        } else {
            format!("--{} {}", self.long, self.value)
        };

        if use_colors {
            option_str.push_str(&format!("{:<30} {}", long_with_value.bright_cyan(), self.description));
        } else {
            option_str.push_str(&format!("{:<30} {}", long_with_value, self.description));
        }

        if let Some(example) = self.example {
            if use_colors {
                option_str.push_str(&format!(
                    "\n{}{}",
                    " ".repeat(36),
                    format!("Example: {}", example).bright_blue().italic()
                ));
            } else {
                option_str.push_str(&format!("\n{}Example: {}", " ".repeat(36), example));
            }
        }

        option_str
    }
}

/// Helper struct for formatting examples
struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}
