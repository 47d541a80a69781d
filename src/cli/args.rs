//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vendaval: dataset folds, label encoding and optimization planning
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "vendaval")]
#[command(version)]
#[command(about = "Dataset preparation and optimization-config resolution for classification training")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the images of a class-per-directory dataset as CSV
    Scan(ScanArgs),

    /// Add a stratified fold column to a CSV table
    Folds(FoldsArgs),

    /// Print the label index of a CSV column as JSON
    Labels(LabelsArgs),

    /// Resolve the step budget and scheduler arguments of a task config
    Plan(PlanArgs),
}

/// Arguments for the scan command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ScanArgs {
    /// Dataset root; each subdirectory is a class
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Output CSV file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Shuffle the rows
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for the shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Accepted file extensions, e.g. `.png` (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,
}

/// Arguments for the folds command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct FoldsArgs {
    /// Input CSV file
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Column holding the class labels
    #[arg(long, default_value = "target")]
    pub label_column: String,

    /// Name of the fold id column to add
    #[arg(long, default_value = "kfold")]
    pub fold_column: String,

    /// Number of folds
    #[arg(short, long, default_value_t = 5)]
    pub k: usize,

    /// Shuffle each class before assigning folds
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for the shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the labels command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct LabelsArgs {
    /// Input CSV file
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Column holding the class labels
    #[arg(long, default_value = "target")]
    pub label_column: String,
}

/// Arguments for the plan command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct PlanArgs {
    /// Task configuration (YAML, or JSON with a `.json` extension)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Batches in one pass over the training data
    #[arg(long)]
    pub num_batches: usize,

    /// Override the trainer's max epochs
    #[arg(long)]
    pub max_epochs: Option<usize>,

    /// Override the trainer's max steps
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Override gradient accumulation
    #[arg(long)]
    pub accumulate: Option<usize>,

    /// Override the number of GPUs
    #[arg(long)]
    pub gpus: Option<usize>,

    /// Output YAML file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
