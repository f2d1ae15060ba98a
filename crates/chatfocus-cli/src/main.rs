//! Chatfocus CLI: run the chat panel focus-policy suite
//!
//! ## Usage
//!
//! ```bash
//! chatfocus run                         # Run against the simulated chat bar
//! chatfocus run --readiness query       # Sidebar only answers visibility queries
//! chatfocus run --steal-focus           # Broken container; the suite must fail
//! chatfocus run --format json           # Machine-readable results
//! chatfocus config > chatfocus.yaml     # Dump the default configuration
//! ```

use chatfocus_cli::{
    logging, render, runner, Cli, CliConfig, CliResult, ColorChoice, Commands, ConfigArgs,
    RunArgs, Verbosity,
};
use clap::Parser;
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every scenario passed
fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    match cli.command {
        Commands::Run(args) => run_focus_suite(&config, &args),
        Commands::Config(args) => {
            run_config(&args)?;
            Ok(true)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}

fn run_focus_suite(config: &CliConfig, args: &RunArgs) -> CliResult<bool> {
    let harness = runner::build_harness_config(args)?;
    info!(
        readiness = ?harness.simulation.readiness,
        policy = ?harness.simulation.policy,
        "running focus suite"
    );

    let results = runner::run_suite(&harness, args)?;
    let rendered = render(&results, args.format.into(), config.color.should_color())?;
    if !config.verbosity.is_quiet() || !results.all_passed() {
        println!("{rendered}");
    }
    Ok(results.all_passed())
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let harness = runner::load_config(args.config.as_deref())?;
    print!("{}", harness.to_yaml()?);
    Ok(())
}
