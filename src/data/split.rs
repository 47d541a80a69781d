//! Train/validation selection by fold id and plain train/test splitting

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::frame::DataFrame;
use crate::error::{Error, Result};

/// Split `frame` into `(train, validation)` for one fold.
///
/// Validation holds the rows whose `fold_column` equals `fold_id`, train holds
/// the rest. Both keep the relative row order of `frame`.
pub fn get_fold(frame: &DataFrame, fold_column: &str, fold_id: i64) -> Result<(DataFrame, DataFrame)> {
    let folds = frame.column(fold_column)?.as_int().ok_or_else(|| {
        Error::config(format!("fold column '{fold_column}' must hold integer fold ids"))
    })?;

    let (valid, train): (Vec<usize>, Vec<usize>) =
        (0..folds.len()).partition(|&i| folds[i] == fold_id);
    Ok((frame.take(&train), frame.take(&valid)))
}

/// Size of the test side of a split
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitSize {
    /// Fraction of the rows in `(0, 1)`; the test count is rounded up
    Fraction(f64),
    /// Absolute number of rows
    Count(usize),
}

/// Non-stratified train/test split
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub test_size: SplitSize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainTestSplit {
    fn default() -> Self {
        Self { test_size: SplitSize::Fraction(0.25), shuffle: true, seed: 42 }
    }
}

impl TrainTestSplit {
    /// Split with a test fraction
    pub fn fraction(test_size: f64) -> Self {
        Self { test_size: SplitSize::Fraction(test_size), ..Self::default() }
    }

    /// Split with an absolute test count
    pub fn count(test_size: usize) -> Self {
        Self { test_size: SplitSize::Count(test_size), ..Self::default() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Number of test rows for a dataset of `n` rows
    pub fn test_count(&self, n: usize) -> Result<usize> {
        let n_test = match self.test_size {
            SplitSize::Fraction(f) if f > 0.0 && f < 1.0 => (f * n as f64).ceil() as usize,
            SplitSize::Fraction(f) => {
                return Err(Error::config(format!("test_size={f} should be in the range (0, 1)")))
            }
            SplitSize::Count(c) => c,
        };
        if n_test == 0 || n_test >= n {
            return Err(Error::config(format!(
                "with n_samples={n} and test size {:?}, one side of the split would be empty",
                self.test_size
            )));
        }
        Ok(n_test)
    }

    /// Train and test row indices
    pub fn indices(&self, n: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        let n_test = self.test_count(n)?;
        let n_train = n - n_test;
        let mut order: Vec<usize> = (0..n).collect();

        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            order.shuffle(&mut rng);
            let train = order[n_test..].to_vec();
            order.truncate(n_test);
            return Ok((train, order));
        }

        let test = order.split_off(n_train);
        Ok((order, test))
    }
}

/// Split `frame` into `(train, test)` frames
pub fn train_test_split(frame: &DataFrame, split: &TrainTestSplit) -> Result<(DataFrame, DataFrame)> {
    let (train, test) = split.indices(frame.len())?;
    Ok((frame.take(&train), frame.take(&test)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::Column;

    fn frame(n: usize) -> DataFrame {
        DataFrame::from_columns(vec![
            Column::text("image_id", (0..n).map(|i| format!("img_{i}")).collect()),
            Column::int("kfold", (0..n).map(|i| (i % 3) as i64).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_fold_partitions_rows() {
        let df = frame(9);
        let (train, valid) = get_fold(&df, "kfold", 1).unwrap();

        assert_eq!(valid.len(), 3);
        assert_eq!(train.len(), 6);
        assert_eq!(valid.column("image_id").unwrap().keys(), vec!["img_1", "img_4", "img_7"]);
        assert!(train.column("kfold").unwrap().as_int().unwrap().iter().all(|&f| f != 1));
    }

    #[test]
    fn test_get_fold_requires_int_column() {
        let df = frame(3);
        let err = get_fold(&df, "image_id", 0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(get_fold(&df, "missing", 0).is_err());
    }

    #[test]
    fn test_fraction_rounds_test_up() {
        let split = TrainTestSplit::fraction(0.25);
        assert_eq!(split.test_count(10).unwrap(), 3);
        assert_eq!(split.test_count(4).unwrap(), 1);
    }

    #[test]
    fn test_unshuffled_split_takes_tail() {
        let df = frame(5);
        let (train, test) =
            train_test_split(&df, &TrainTestSplit::count(2).without_shuffle()).unwrap();
        assert_eq!(train.column("image_id").unwrap().keys(), vec!["img_0", "img_1", "img_2"]);
        assert_eq!(test.column("image_id").unwrap().keys(), vec!["img_3", "img_4"]);
    }

    #[test]
    fn test_shuffled_split_is_seeded_and_disjoint() {
        let split = TrainTestSplit::fraction(0.3).with_seed(11);
        let (train_a, test_a) = split.indices(50).unwrap();
        let (train_b, test_b) = split.indices(50).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 15);

        let mut all: Vec<usize> = train_a.iter().chain(&test_a).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(TrainTestSplit::fraction(1.0).test_count(10).is_err());
        assert!(TrainTestSplit::fraction(0.0).test_count(10).is_err());
        assert!(TrainTestSplit::count(10).test_count(10).is_err());
        assert!(TrainTestSplit::count(0).test_count(10).is_err());
    }
}
