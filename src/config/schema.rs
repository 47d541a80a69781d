//! YAML/JSON schema definitions for a task configuration
//!
//! ```yaml
//! model:
//!   lr: 0.001
//! loss:
//!   name: LabelSmoothingCrossEntropy
//!   init_args: { eps: 0.1 }
//! optimization:
//!   optimizer:
//!     name: AdamW
//!     init_args: { lr: 0.001, weight_decay: 0.01 }
//!   scheduler:
//!     name: OneCycleLR
//!     init_args: { max_lr: 0.001, epochs: infer, steps_per_epoch: infer }
//!     interval: step
//!   max_epochs: infer
//!   max_steps: infer
//!   steps_per_epoch: infer
//! trainer:
//!   max_epochs: 10
//!   accumulate_grad_batches: 2
//! ```

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::optim::InitArgs;
use crate::train::LossSpec;

/// Marker for a value filled in at setup time
pub const INFER: &str = "infer";

/// A quantity that is either given explicitly or inferred from the trainer
///
/// Serialized as the string `"infer"` or as the value itself; `null` and a
/// missing field also mean [`Resolvable::Infer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolvable<T> {
    Infer,
    Value(T),
}

impl<T> Default for Resolvable<T> {
    fn default() -> Self {
        Self::Infer
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Copy> Resolvable<T> {
    pub fn is_infer(&self) -> bool {
        matches!(self, Self::Infer)
    }

    pub fn value(&self) -> Option<T> {
        match self {
            Self::Infer => None,
            Self::Value(v) => Some(*v),
        }
    }

    /// The explicit value, or `inferred` when marked for inference
    pub fn resolve_or(&self, inferred: T) -> T {
        self.value().unwrap_or(inferred)
    }
}

impl<T: fmt::Display> fmt::Display for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infer => f.write_str(INFER),
            Self::Value(v) => v.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Resolvable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Infer => serializer.serialize_str(INFER),
            Self::Value(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Resolvable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Marker(String),
            Value(T),
        }

        match Option::<Raw<T>>::deserialize(deserializer)? {
            None => Ok(Self::Infer),
            Some(Raw::Marker(s)) if s == INFER => Ok(Self::Infer),
            Some(Raw::Marker(s)) => {
                Err(D::Error::custom(format!("expected a value or \"{INFER}\", got \"{s}\"")))
            }
            Some(Raw::Value(v)) => Ok(Self::Value(v)),
        }
    }
}

/// Optimizer name and keyword arguments; a missing name means no optimizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_args: Option<InitArgs>,
}

impl OptimizerSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), init_args: None }
    }
}

/// How often the trainer steps the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Step,
    Epoch,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Epoch => "epoch",
        }
    }
}

/// Scheduler name, keyword arguments and stepping policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_args: Option<InitArgs>,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
}

impl SchedulerSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }
}

/// The `optimization` section of a task config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default)]
    pub optimizer: OptimizerSpec,
    #[serde(default)]
    pub scheduler: SchedulerSpec,
    #[serde(default)]
    pub max_steps: Resolvable<usize>,
    #[serde(default)]
    pub max_epochs: Resolvable<usize>,
    #[serde(default)]
    pub steps_per_epoch: Resolvable<usize>,
}

/// Training-batch cap: an absolute count or a fraction of the epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchLimit {
    Count(usize),
    Fraction(f64),
}

/// The `trainer` section: quantities an external trainer would supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainerConfig {
    #[serde(default)]
    pub max_epochs: Option<usize>,
    #[serde(default)]
    pub max_steps: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_train_batches: Option<BatchLimit>,
    #[serde(default = "default_one")]
    pub accumulate_grad_batches: usize,
    #[serde(default)]
    pub num_gpus: usize,
    #[serde(default = "default_one")]
    pub num_processes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpu_cores: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_epochs: None,
            max_steps: None,
            limit_train_batches: None,
            accumulate_grad_batches: 1,
            num_gpus: 0,
            num_processes: 1,
            tpu_cores: None,
        }
    }
}

fn default_one() -> usize {
    1
}

/// Model hyperparameters the task reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHypers {
    /// Peak learning rate; replaces any `max_lr` scheduler argument
    #[serde(default = "default_lr")]
    pub lr: f32,
}

impl Default for ModelHypers {
    fn default() -> Self {
        Self { lr: default_lr() }
    }
}

fn default_lr() -> f32 {
    1e-3
}

/// The `data` section: how folds are assigned to a labeled table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_fold_column")]
    pub fold_column: String,
    #[serde(default = "default_n_splits")]
    pub n_splits: usize,
    /// Shuffle each class with `seed` before assigning folds
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            label_column: default_label_column(),
            fold_column: default_fold_column(),
            n_splits: default_n_splits(),
            shuffle: false,
            seed: default_seed(),
        }
    }
}

impl DataConfig {
    /// Fold splitter described by this section
    pub fn kfold(&self) -> crate::data::StratifiedKFold {
        let kfold = crate::data::StratifiedKFold::new(self.n_splits);
        if self.shuffle {
            kfold.with_seed(self.seed)
        } else {
            kfold
        }
    }
}

fn default_label_column() -> String {
    crate::data::TARGET_COLUMN.to_string()
}

fn default_fold_column() -> String {
    crate::data::FOLD_COLUMN.to_string()
}

fn default_n_splits() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

/// Complete task configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub model: ModelHypers,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<LossSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer: Option<TrainerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Holder {
        #[serde(default)]
        n: Resolvable<usize>,
    }

    #[test]
    fn test_resolvable_parsing() {
        let h: Holder = serde_yaml::from_str("n: infer").unwrap();
        assert_eq!(h.n, Resolvable::Infer);
        let h: Holder = serde_yaml::from_str("n: 12").unwrap();
        assert_eq!(h.n, Resolvable::Value(12));
        let h: Holder = serde_yaml::from_str("n: null").unwrap();
        assert_eq!(h.n, Resolvable::Infer);
        let h: Holder = serde_yaml::from_str("{}").unwrap();
        assert_eq!(h.n, Resolvable::Infer);
    }

    #[test]
    fn test_resolvable_rejects_sentinels() {
        assert!(serde_yaml::from_str::<Holder>("n: -1").is_err());
        assert!(serde_yaml::from_str::<Holder>("n: auto").is_err());
    }

    #[test]
    fn test_resolvable_serializes_marker() {
        let json = serde_json::to_string(&Holder { n: Resolvable::Infer }).unwrap();
        assert_eq!(json, r#"{"n":"infer"}"#);
        let json = serde_json::to_string(&Holder { n: Resolvable::Value(3) }).unwrap();
        assert_eq!(json, r#"{"n":3}"#);
    }

    #[test]
    fn test_resolve_or() {
        assert_eq!(Resolvable::Infer.resolve_or(7), 7);
        assert_eq!(Resolvable::Value(3).resolve_or(7), 3);
        assert_eq!(Resolvable::<usize>::Infer.to_string(), "infer");
    }

    #[test]
    fn test_optimization_defaults() {
        let conf: OptimizationConfig = serde_yaml::from_str("optimizer: { name: SGD }").unwrap();
        assert_eq!(conf.optimizer.name.as_deref(), Some("SGD"));
        assert!(conf.scheduler.name.is_none());
        assert_eq!(conf.scheduler.interval, Interval::Step);
        assert!(conf.max_steps.is_infer());
    }

    #[test]
    fn test_batch_limit_untagged() {
        let t: TrainerConfig = serde_yaml::from_str("limit_train_batches: 100").unwrap();
        assert_eq!(t.limit_train_batches, Some(BatchLimit::Count(100)));
        let t: TrainerConfig = serde_yaml::from_str("limit_train_batches: 0.25").unwrap();
        assert_eq!(t.limit_train_batches, Some(BatchLimit::Fraction(0.25)));
        assert_eq!(t.accumulate_grad_batches, 1);
        assert_eq!(t.num_processes, 1);
    }

    #[test]
    fn test_invalid_interval() {
        let res = serde_yaml::from_str::<SchedulerSpec>("name: StepLR\ninterval: batch");
        assert!(res.is_err());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
model:
  lr: 0.01
loss:
  name: FocalLoss
optimization:
  optimizer:
    name: AdamW
    init_args: { lr: 0.001 }
  scheduler:
    name: OneCycleLR
    init_args: { max_lr: 0.01, epochs: infer, steps_per_epoch: infer }
    interval: step
    monitor: val/loss
  max_epochs: 3
trainer:
  max_epochs: 3
data:
  n_splits: 4
"#;
        let config: TaskConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.model.lr, 0.01);
        assert_eq!(config.loss.as_ref().map(|l| l.name.as_str()), Some("FocalLoss"));
        let opt = config.optimization.as_ref().unwrap();
        assert_eq!(opt.max_epochs, Resolvable::Value(3));
        assert_eq!(opt.scheduler.monitor.as_deref(), Some("val/loss"));
        let init = opt.scheduler.init_args.as_ref().unwrap();
        assert_eq!(init["epochs"], serde_json::json!("infer"));
        let data = config.data.as_ref().unwrap();
        assert_eq!(data.n_splits, 4);
        assert_eq!(data.label_column, "target");
        assert_eq!(data.fold_column, "kfold");
        assert!(!data.shuffle);

        let round_trip: TaskConfig =
            serde_yaml::from_str(&serde_yaml::to_string(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn test_data_section_folds_in_row_order_unless_shuffled() {
        let data: DataConfig = serde_yaml::from_str("n_splits: 3").unwrap();
        assert!(!data.kfold().is_shuffled());
        assert_eq!(data.kfold().fold_ids(&["a"; 6]).unwrap(), vec![0, 1, 2, 0, 1, 2]);

        let data: DataConfig = serde_yaml::from_str("n_splits: 3\nshuffle: true\nseed: 7").unwrap();
        let kfold = data.kfold();
        assert!(kfold.is_shuffled());
        assert_eq!(kfold.n_splits(), 3);
    }
}
