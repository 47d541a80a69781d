//! CLI command implementations

mod folds;
mod labels;
mod plan;
mod scan;


use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::args::{Cli, Command};
use super::logging::LogLevel;
use crate::data::DataFrame;
use crate::error::Result;
use crate::logging::{setup_logger_with_writer, DEFAULT_NAME};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);
    // stdout carries command output (CSV, JSON, YAML)
    setup_logger_with_writer(0, DEFAULT_NAME, log_level.tracing_level(), io::stderr);

    match cli.command {
        Command::Scan(args) => scan::run_scan(args, log_level),
        Command::Folds(args) => folds::run_folds(args, log_level),
        Command::Labels(args) => labels::run_labels(args, log_level),
        Command::Plan(args) => plan::run_plan(args, log_level),
    }
}

/// Write `frame` as CSV to `output`, or to stdout
fn write_frame(frame: &DataFrame, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => frame.write_csv(path),
        None => frame.to_csv_writer(io::stdout().lock()),
    }
}

/// Write `text` to `output`, or to stdout
fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => Ok(File::create(path)?.write_all(text.as_bytes())?),
        None => Ok(io::stdout().lock().write_all(text.as_bytes())?),
    }
}
