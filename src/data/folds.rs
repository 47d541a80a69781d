//! Stratified K-Fold splitting

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::frame::{Column, DataFrame};
use crate::error::{Error, Result};

/// Default name of the fold id column
pub const FOLD_COLUMN: &str = "kfold";

/// Stratified K-Fold splitter
///
/// Every fold receives either `floor(n_c / k)` or `ceil(n_c / k)` records of
/// each class `c`, so fold class proportions track the whole dataset. Without
/// a seed the assignment depends only on row order.
#[derive(Clone, Debug)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    seed: u64,
}

impl StratifiedKFold {
    /// Create a new splitter with `n_splits` folds; rows are not shuffled
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits, shuffle: false, seed: 0 }
    }

    /// Shuffle each class with `seed` before dealing it onto the folds
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    /// Disable shuffling
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// Assign a fold id in `[0, n_splits)` to every label.
    ///
    /// Records of each class (classes visited in sorted order) are dealt
    /// round-robin onto the folds, continuing from where the previous class
    /// stopped, which also keeps total fold sizes within one of each other.
    pub fn fold_ids<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        if self.n_splits < 2 {
            return Err(Error::config(format!(
                "k-fold cross-validation requires at least 2 splits, got {}",
                self.n_splits
            )));
        }

        let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            by_class.entry(label.as_ref()).or_default().push(i);
        }

        if let Some((class, members)) = by_class.iter().min_by_key(|(_, m)| m.len()) {
            if members.len() < self.n_splits {
                return Err(Error::config(format!(
                    "n_splits={} cannot be greater than the number of members in each class; \
                     class '{class}' has {} members",
                    self.n_splits,
                    members.len()
                )));
            }
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut folds = vec![0usize; labels.len()];
        let mut next_fold = 0;
        for members in by_class.values_mut() {
            if self.shuffle {
                members.shuffle(&mut rng);
            }
            for &row in members.iter() {
                folds[row] = next_fold;
                next_fold = (next_fold + 1) % self.n_splits;
            }
        }
        Ok(folds)
    }

    /// Generate train/test indices for each fold
    pub fn split<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let ids = self.fold_ids(labels)?;
        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..ids.len()).partition(|&i| ids[i] == fold);
                (train, test)
            })
            .collect())
    }
}

/// Add a stratified fold id column to a copy of `frame`.
///
/// `fold_column` defaults to [`FOLD_COLUMN`]. The input frame is untouched.
pub fn split_stratified_folds(
    frame: &DataFrame,
    label_column: &str,
    fold_column: Option<&str>,
    kfold: &StratifiedKFold,
) -> Result<DataFrame> {
    let labels = frame.column(label_column)?.keys();
    let ids = kfold.fold_ids(&labels)?;

    let mut data = frame.clone();
    data.insert_column(Column::int(
        fold_column.unwrap_or(FOLD_COLUMN),
        ids.into_iter().map(|f| f as i64).collect(),
    ))?;
    Ok(data)
}
