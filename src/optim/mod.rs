//! Optimizers, learning rate schedulers and the registries that build them

mod adam;
mod adamw;
mod optimizer;
mod registry;
pub mod scheduler;
mod sgd;

pub use adam::{Adam, AdamArgs};
pub use adamw::AdamW;
pub use optimizer::{Optimizer, ParamGroup, Parameter};
pub use registry::{
    build_optimizer, build_scheduler, register_optimizer, register_scheduler, InitArgs,
    OptimizerFactory, OptimizerRegistry, SchedulerFactory, SchedulerRegistry, BUILTIN_OPTIMIZERS,
    BUILTIN_SCHEDULERS,
};
pub use scheduler::{
    CosineAnnealingLR, LRScheduler, LinearWarmupLR, OneCycleLR, StepLR, WarmupCosineLR,
};
pub use sgd::{SgdArgs, SGD};
