//! Command-line interface for vendaval
//!
//! # Usage
//!
//! ```bash
//! vendaval scan data/train --output train.csv --shuffle
//! vendaval folds train.csv --label-column target --k 5 --output folds.csv
//! vendaval labels train.csv
//! vendaval plan task.yaml --num-batches 500 --max-steps 1000
//! ```

mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, FoldsArgs, LabelsArgs, PlanArgs, ScanArgs};
pub use commands::run_command;
pub use logging::LogLevel;
