//! Host Probe - Main CLI Application
//!
//! Runs the diagnostic pipeline against one host and prints a per-stage
//! report. Stage outcomes never change the exit code; only argument and
//! configuration errors do.

use clap::Parser;
use host_probe::{
    cli::{Cli, HelpSystem},
    config::{display_config_summary, load_config, validate_config, ValidationLevel},
    error::{AppError, Result},
    output::{render, OutputMode},
    DiagnosticPipeline, PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", HelpSystem::new().display_main_help(false));
            process::exit(1);
        }
    };

    if cli.help {
        println!("{}", cli.display_help());
        return;
    }

    if cli.host().is_none() {
        let help = HelpSystem::new();
        let use_colors = cli.use_colors();
        eprintln!("{}", AppError::config("Missing required option --host").format_for_console(use_colors));
        eprintln!();
        eprintln!("{}", help.display_usage(use_colors));
        eprintln!("{}", help.display_main_help(use_colors));
        process::exit(1);
    }

    if let Err(e) = run_application(cli.clone()).await {
        eprintln!("{}", e.format_for_console(cli.use_colors()));

        print_error_suggestions(&e);

        if matches!(e, AppError::Config(_) | AppError::Parse(_)) {
            eprintln!();
            eprintln!("{}", cli.display_help());
        }

        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        eprintln!("Debug mode enabled");
        eprintln!();
    }

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Text };
    let config = load_config(cli)?;

    if config.debug {
        eprintln!("Configuration loaded successfully:");
        eprintln!("{}", display_config_summary(&config));
        eprintln!();
    }

    for warning in validate_config(&config)? {
        if warning.level == ValidationLevel::Warning || config.verbose {
            eprintln!("{}", warning.format(config.enable_color));
        }
    }

    let report = DiagnosticPipeline::new().run(&config).await?;
    println!("{}", render(&report, mode)?);

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Pass the target with -h/--host <ADDRESS>");
            eprintln!("  - Host names must not contain whitespace");
            eprintln!("  - Timeouts are in milliseconds and must be greater than 0");
        }
        AppError::Parse(_) => {
            eprintln!();
            eprintln!("Port list help:");
            eprintln!("  - Use comma-separated ports and ranges, e.g. 22,80,8000-8010");
            eprintln!("  - Ports must be between 1 and 65535");
        }
        AppError::Internal(_) => {
            eprintln!();
            eprintln!("This looks like a bug; rerun with --debug and report the output.");
        }
        _ => {}
    }
}
