//! Pool Latency Bench - command-line entry point
//!
//! Runs a fixed number of database lookups or HTTP GET requests through a
//! bounded worker pool and reports the latency distribution.

use clap::Parser;
use pool_latency_bench::{
    cli::Cli,
    config::{load_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    sampler, App, PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if std::thread::current().name() == Some("main") {
            eprintln!("Application panic: {}", panic_info);
            process::exit(99);
        }
        // The sampler records these as failed samples
        if sampler::invocation_in_progress() {
            return;
        }
        default_hook(panic_info);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return;
    }

    let use_color = cli.use_colors();
    let verbose = cli.verbose || cli.debug;

    if let Err(e) = run_application(cli).await {
        ErrorReporter::new(use_color, verbose).report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    if let Some(ref path) = cli.env_example {
        EnvManager::save_example_env_file(path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    if cli.debug {
        println!(
            "{} v{} ({}, built {})",
            PKG_NAME,
            VERSION,
            env!("GIT_COMMIT"),
            env!("BUILD_TIME")
        );
        println!("{}", cli.get_config_summary());
    }

    let config = load_config(cli)?;
    let outcome = App::new(config).run().await?;

    if outcome.statistics.all_failed() {
        return Err(AppError::execution(format!(
            "all {} recorded invocations of '{}' failed",
            outcome.statistics.total, outcome.task_name
        )));
    }

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (plb --help-topic env)");
            eprintln!("  - HTTP runs need --url, DB runs need --target db --database-url");
            eprintln!("  - Loop and concurrency must both be at least 1");
        }
        AppError::Database(_) | AppError::NotFound(_) => {
            eprintln!();
            eprintln!("Database help:");
            eprintln!("  - Only sqlite: URLs are supported");
            eprintln!("  - Use --db-init to create the lookup table and key row");
        }
        AppError::Execution(_) => {
            eprintln!();
            eprintln!("Execution troubleshooting:");
            eprintln!("  - Re-run with --verbose to see each failure");
            eprintln!("  - Increase the per-invocation timeout with --timeout");
            eprintln!("  - Check that the target is reachable");
        }
        _ => {}
    }
}
