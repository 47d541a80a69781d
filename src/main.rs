//! Vendaval CLI
//!
//! # Usage
//!
//! ```bash
//! # List a class-per-directory dataset
//! vendaval scan data/train --output train.csv --shuffle --seed 42
//!
//! # Assign stratified folds
//! vendaval folds train.csv --label-column target --k 5 --output folds.csv
//!
//! # Show the label index
//! vendaval labels train.csv
//!
//! # Resolve the optimization plan of a task config
//! vendaval plan task.yaml --num-batches 500 --max-steps 1000
//! ```

use clap::Parser;
use std::process::ExitCode;
use vendaval::cli::{run_command, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
