//! Dataset preparation for image classification
//!
//! - [`folder_to_frame`] - list images from a class-per-directory layout
//! - [`split_stratified_folds`] / [`get_fold`] - stratified K-fold assignment and selection
//! - [`train_test_split`] - plain train/test split
//! - [`build_index`] / [`encode`] / [`labels_to_int`] - label encoding
//!
//! # Example
//!
//! ```no_run
//! use vendaval::data::{folder_to_frame, get_fold, split_stratified_folds, FolderOptions, StratifiedKFold};
//!
//! let df = folder_to_frame("data/train", &FolderOptions::default())?;
//! let df = split_stratified_folds(&df, "target", None, &StratifiedKFold::new(5))?;
//! let (train, valid) = get_fold(&df, "kfold", 0)?;
//! # Ok::<(), vendaval::Error>(())
//! ```

mod folder;
mod folds;
mod frame;
mod labels;
mod split;

pub use folder::{folder_to_frame, FolderOptions, IMAGE_COLUMN, IMG_EXTENSIONS, TARGET_COLUMN};
pub use folds::{split_stratified_folds, StratifiedKFold, FOLD_COLUMN};
pub use frame::{Column, ColumnData, DataFrame};
pub use labels::{build_index, decode, encode, labels_to_int, LabelIndex};
pub use split::{get_fold, train_test_split, SplitSize, TrainTestSplit};
