//! CLI command definitions using clap

use chatfocus::mock::ReadinessOrder;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chatfocus: check that background chat panels never steal focus
#[derive(Parser, Debug)]
#[command(name = "chatfocus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the focus suite against the simulated chat bar
    Run(RunArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Harness configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Condition polling interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Condition wait timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Sidebar handshake timeout in milliseconds
    #[arg(long)]
    pub handshake_timeout_ms: Option<u64>,

    /// When the simulated sidebar reports readiness
    #[arg(long)]
    pub readiness: Option<ReadinessArg>,

    /// Let background opens steal focus (the suite should then fail)
    #[arg(long)]
    pub steal_focus: bool,

    /// Bound on the whole suite in milliseconds
    #[arg(long, default_value = "120000")]
    pub suite_timeout_ms: u64,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Result format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration file to load instead of the defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Sidebar readiness ordering
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadinessArg {
    /// Readiness signal before init-done
    Before,
    /// Readiness signal after init-done
    After,
    /// Readiness only in answer to a visibility query
    Query,
}

impl From<ReadinessArg> for ReadinessOrder {
    fn from(arg: ReadinessArg) -> Self {
        match arg {
            ReadinessArg::Before => Self::BeforeInitDone,
            ReadinessArg::After => Self::AfterInitDone,
            ReadinessArg::Query => Self::OnQueryOnly,
        }
    }
}

/// Result output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
