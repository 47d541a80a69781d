//! Optimizer and scheduler registries
//!
//! Both map a config name to a factory taking the config's `init_args`.
//! Optimizer factories also receive the model's parameter groups; scheduler
//! factories receive the optimizer they drive.

use std::sync::{LazyLock, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::adam::{Adam, AdamArgs};
use super::adamw::AdamW;
use super::optimizer::{Optimizer, ParamGroup};
use super::scheduler::{
    CosineAnnealingLR, LRScheduler, LinearWarmupLR, OneCycleLR, StepLR, WarmupCosineLR,
};
use super::sgd::SGD;
use crate::error::{Error, Result};
use crate::registry::Registry;

/// Keyword arguments from a config, after any inferred values are filled in
pub type InitArgs = Map<String, Value>;

/// Constructor of an optimizer over the given parameter groups
pub type OptimizerFactory = fn(&[ParamGroup], &InitArgs) -> Result<Box<dyn Optimizer>>;

/// Constructor of a scheduler driving the given optimizer
pub type SchedulerFactory = fn(&dyn Optimizer, &InitArgs) -> Result<Box<dyn LRScheduler>>;

/// Deserialize `args` into the typed arguments of `target`
pub(crate) fn parse_args<T: DeserializeOwned>(target: &str, args: &InitArgs) -> Result<T> {
    serde_json::from_value(Value::Object(args.clone()))
        .map_err(|e| Error::invalid_argument(target, e))
}

fn sgd(groups: &[ParamGroup], args: &InitArgs) -> Result<Box<dyn Optimizer>> {
    Ok(Box::new(SGD::for_groups(groups, parse_args("SGD", args)?)))
}

fn adam(groups: &[ParamGroup], args: &InitArgs) -> Result<Box<dyn Optimizer>> {
    Ok(Box::new(Adam::for_groups(groups, parse_args("Adam", args)?)))
}

fn adamw(groups: &[ParamGroup], args: &InitArgs) -> Result<Box<dyn Optimizer>> {
    let mut args: Map<String, Value> = args.clone();
    args.entry("weight_decay").or_insert(Value::from(0.01));
    let args: AdamArgs = parse_args("AdamW", &args)?;
    Ok(Box::new(AdamW::for_groups(groups, args)))
}

fn cosine_annealing(opt: &dyn Optimizer, args: &InitArgs) -> Result<Box<dyn LRScheduler>> {
    Ok(Box::new(CosineAnnealingLR::from_args(opt.lr(), parse_args("CosineAnnealingLR", args)?)))
}

fn linear_warmup(opt: &dyn Optimizer, args: &InitArgs) -> Result<Box<dyn LRScheduler>> {
    Ok(Box::new(LinearWarmupLR::from_args(opt.lr(), parse_args("LinearWarmupLR", args)?)))
}

fn one_cycle(_opt: &dyn Optimizer, args: &InitArgs) -> Result<Box<dyn LRScheduler>> {
    Ok(Box::new(OneCycleLR::from_args(parse_args("OneCycleLR", args)?)?))
}

fn step_lr(opt: &dyn Optimizer, args: &InitArgs) -> Result<Box<dyn LRScheduler>> {
    Ok(Box::new(StepLR::from_args(opt.lr(), parse_args("StepLR", args)?)))
}

fn warmup_cosine(opt: &dyn Optimizer, args: &InitArgs) -> Result<Box<dyn LRScheduler>> {
    Ok(Box::new(WarmupCosineLR::from_args(opt.lr(), parse_args("WarmupCosineLR", args)?)))
}

/// Optimizers registered by [`OptimizerRegistry::with_builtins`]
pub const BUILTIN_OPTIMIZERS: [(&str, OptimizerFactory); 3] =
    [("Adam", adam), ("AdamW", adamw), ("SGD", sgd)];

/// Schedulers registered by [`SchedulerRegistry::with_builtins`]
pub const BUILTIN_SCHEDULERS: [(&str, SchedulerFactory); 5] = [
    ("CosineAnnealingLR", cosine_annealing),
    ("LinearWarmupLR", linear_warmup),
    ("OneCycleLR", one_cycle),
    ("StepLR", step_lr),
    ("WarmupCosineLR", warmup_cosine),
];

/// Name-keyed table of optimizer factories
#[derive(Debug, Clone)]
pub struct OptimizerRegistry {
    inner: Registry<OptimizerFactory>,
}

impl Default for OptimizerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl OptimizerRegistry {
    pub const NAME: &'static str = "Optimizer Registry";

    pub fn new() -> Self {
        Self { inner: Registry::new(Self::NAME) }
    }

    pub fn with_builtins() -> Self {
        Self { inner: Registry::with_entries(Self::NAME, BUILTIN_OPTIMIZERS) }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: OptimizerFactory) -> Result<()> {
        self.inner.register(name, factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.names().map(str::to_string).collect()
    }

    /// Build the optimizer `name` over `groups`
    pub fn build(
        &self,
        name: &str,
        init_args: Option<&InitArgs>,
        groups: &[ParamGroup],
    ) -> Result<Box<dyn Optimizer>> {
        let factory = self.inner.get(name).ok_or_else(|| Error::UnknownOptimizer(name.into()))?;
        factory(groups, init_args.unwrap_or(&Map::new()))
    }
}

/// Name-keyed table of scheduler factories
#[derive(Debug, Clone)]
pub struct SchedulerRegistry {
    inner: Registry<SchedulerFactory>,
}

impl Default for SchedulerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl SchedulerRegistry {
    pub const NAME: &'static str = "Scheduler Registry";

    pub fn new() -> Self {
        Self { inner: Registry::new(Self::NAME) }
    }

    pub fn with_builtins() -> Self {
        Self { inner: Registry::with_entries(Self::NAME, BUILTIN_SCHEDULERS) }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: SchedulerFactory) -> Result<()> {
        self.inner.register(name, factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.names().map(str::to_string).collect()
    }

    /// Build the scheduler `name` driving `optimizer`
    pub fn build(
        &self,
        name: &str,
        init_args: Option<&InitArgs>,
        optimizer: &dyn Optimizer,
    ) -> Result<Box<dyn LRScheduler>> {
        let factory = self.inner.get(name).ok_or_else(|| Error::UnknownScheduler(name.into()))?;
        factory(optimizer, init_args.unwrap_or(&Map::new()))
    }
}

static OPTIMIZER_REGISTRY: LazyLock<RwLock<OptimizerRegistry>> =
    LazyLock::new(|| RwLock::new(OptimizerRegistry::with_builtins()));

static SCHEDULER_REGISTRY: LazyLock<RwLock<SchedulerRegistry>> =
    LazyLock::new(|| RwLock::new(SchedulerRegistry::with_builtins()));

/// Register a custom optimizer in the process-wide registry
pub fn register_optimizer(name: impl Into<String>, factory: OptimizerFactory) -> Result<()> {
    OPTIMIZER_REGISTRY.write().unwrap_or_else(PoisonError::into_inner).register(name, factory)
}

/// Register a custom scheduler in the process-wide registry
pub fn register_scheduler(name: impl Into<String>, factory: SchedulerFactory) -> Result<()> {
    SCHEDULER_REGISTRY.write().unwrap_or_else(PoisonError::into_inner).register(name, factory)
}

/// Build an optimizer through the process-wide registry
pub fn build_optimizer(
    name: &str,
    init_args: Option<&InitArgs>,
    groups: &[ParamGroup],
) -> Result<Box<dyn Optimizer>> {
    OPTIMIZER_REGISTRY.read().unwrap_or_else(PoisonError::into_inner).build(name, init_args, groups)
}

/// Build a scheduler through the process-wide registry
pub fn build_scheduler(
    name: &str,
    init_args: Option<&InitArgs>,
    optimizer: &dyn Optimizer,
) -> Result<Box<dyn LRScheduler>> {
    SCHEDULER_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .build(name, init_args, optimizer)
}
