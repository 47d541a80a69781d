//! Labels command implementation

use super::write_text;
use crate::cli::args::LabelsArgs;
use crate::cli::logging::{log, LogLevel};
use crate::data::{build_index, DataFrame};
use crate::error::Result;

pub fn run_labels(args: LabelsArgs, level: LogLevel) -> Result<()> {
    let frame = DataFrame::read_csv(&args.input)?;
    let index = build_index(&frame, &args.label_column)?;

    log(level, LogLevel::Verbose, &format!("  Classes: {}", index.num_classes()));
    let json = serde_json::to_string_pretty(&index)?;
    write_text(&format!("{json}\n"), None)
}
