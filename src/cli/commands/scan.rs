//! Scan command implementation

use super::write_frame;
use crate::cli::args::ScanArgs;
use crate::cli::logging::{log, LogLevel};
use crate::data::{folder_to_frame, FolderOptions, TARGET_COLUMN};
use crate::error::Result;

pub fn run_scan(args: ScanArgs, level: LogLevel) -> Result<()> {
    let mut options = FolderOptions::default();
    if args.shuffle {
        options = options.shuffled(args.seed);
    }
    if !args.extensions.is_empty() {
        options = options.with_extensions(args.extensions.iter().map(|e| normalize_extension(e)));
    }

    let frame = folder_to_frame(&args.dir, &options)?;
    write_frame(&frame, args.output.as_deref())?;

    if let Some(output) = &args.output {
        let classes = frame.column(TARGET_COLUMN)?.distinct_sorted().len();
        log(
            level,
            LogLevel::Normal,
            &format!("✓ Wrote {} images in {classes} classes to {}", frame.len(), output.display()),
        );
    }
    Ok(())
}

/// `png` and `.png` both mean files ending in `.png`
pub(crate) fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
