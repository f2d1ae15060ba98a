//! Chatfocus CLI Library
//!
//! Command-line front end for the chat panel focus-policy suite.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, FormatArg, ReadinessArg, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render, render_text, OutputFormat};
