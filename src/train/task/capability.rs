//! Capabilities a model exposes to a [`Task`](super::Task)

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::optim::ParamGroup;
use crate::train::LossFn;

/// Which loop a step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Train,
    Validation,
    Test,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }

    /// Prefix for logged values
    pub fn log_prefix(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "val",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a step sees besides the batch
pub struct StepContext<'a> {
    pub stage: Stage,
    pub batch_idx: usize,
    /// The task's loss, when its config names one
    pub loss: Option<&'a dyn LossFn>,
}

/// Result of a shared step: the value to optimize and values to log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutput {
    pub loss: f32,
    pub logs: BTreeMap<String, f32>,
}

impl StepOutput {
    pub fn new(loss: f32) -> Self {
        Self { loss, logs: BTreeMap::new() }
    }

    pub fn with_log(mut self, key: impl Into<String>, value: f32) -> Self {
        self.logs.insert(key.into(), value);
        self
    }
}

/// A model that can run one step on a batch
///
/// The same step serves training, validation and testing; the stage is in
/// the [`StepContext`].
pub trait Trainable {
    type Batch;

    fn shared_step(&mut self, batch: &Self::Batch, ctx: &StepContext<'_>) -> Result<StepOutput>;
}

/// A model whose parameters are split into ordered groups
///
/// Groups run from the input side (index 0) to the head. Freezing works on
/// whole groups.
pub trait ParameterGrouped {
    fn param_groups(&self) -> &[ParamGroup];

    fn param_groups_mut(&mut self) -> &mut [ParamGroup];

    /// Peak learning rate from the model's own hyperparameters
    ///
    /// `None` falls back to the task config's `model.lr`.
    fn max_lr(&self) -> Option<f32> {
        None
    }

    /// Make every parameter trainable
    fn unfreeze(&mut self) {
        set_requires_grad(self.param_groups_mut(), true);
    }

    /// Freeze every parameter
    fn freeze(&mut self) {
        set_requires_grad(self.param_groups_mut(), false);
    }

    /// Freeze groups before `n`, unfreeze the rest
    ///
    /// A negative `n` counts from the end.
    fn freeze_to(&mut self, n: isize) {
        let groups = self.param_groups_mut();
        let len = groups.len();
        let idx = if n >= 0 { n.unsigned_abs() } else { len.saturating_sub(n.unsigned_abs()) };
        if idx >= len {
            tracing::warn!("Freezing {idx} groups; model has {len}; whole model is frozen.");
        }
        let split = idx.min(len);
        set_requires_grad(&mut groups[..split], false);
        set_requires_grad(&mut groups[split..], true);
    }

    /// Run `f` with the model frozen, then unfreeze it
    fn with_frozen<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized,
    {
        self.freeze();
        let out = f(self);
        self.unfreeze();
        out
    }

    fn num_trainable(&self) -> usize {
        self.param_groups().iter().map(ParamGroup::num_trainable).sum()
    }
}

fn set_requires_grad(groups: &mut [ParamGroup], requires_grad: bool) {
    for param in groups.iter_mut().flat_map(|g| g.params.iter_mut()) {
        param.set_requires_grad(requires_grad);
    }
}

/// A component that can be rebuilt from its configuration
pub trait ConfigSerializable: Sized {
    type Config: Serialize + DeserializeOwned;

    fn to_config(&self) -> Self::Config;

    fn from_config(config: Self::Config) -> Result<Self>;

    fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_config())?)
    }

    fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_config(serde_yaml::from_str(yaml)?)
    }
}
