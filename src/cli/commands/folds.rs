//! Folds command implementation

use super::write_frame;
use crate::cli::args::FoldsArgs;
use crate::cli::logging::{log, LogLevel};
use crate::data::{split_stratified_folds, DataFrame, StratifiedKFold};
use crate::error::Result;

pub fn run_folds(args: FoldsArgs, level: LogLevel) -> Result<()> {
    let frame = DataFrame::read_csv(&args.input)?;

    let mut kfold = StratifiedKFold::new(args.k);
    if args.shuffle {
        kfold = kfold.with_seed(args.seed);
    }

    let frame =
        split_stratified_folds(&frame, &args.label_column, Some(&args.fold_column), &kfold)?;
    write_frame(&frame, args.output.as_deref())?;

    if let Some(output) = &args.output {
        log(
            level,
            LogLevel::Normal,
            &format!("✓ Assigned {} rows to {} folds in {}", frame.len(), args.k, output.display()),
        );
    }
    log(level, LogLevel::Verbose, &format!("  Label column: {}", args.label_column));
    log(level, LogLevel::Verbose, &format!("  Fold column: {}", args.fold_column));
    Ok(())
}
