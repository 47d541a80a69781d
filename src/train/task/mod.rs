//! Task base: optimization setup and step hooks around a model
//!
//! A [`Task`] composes three model capabilities:
//! - [`Trainable`] - one shared step for train/validation/test
//! - [`ParameterGrouped`] - ordered parameter groups, freezing
//! - [`ConfigSerializable`] - rebuild from a config
//!
//! Step counts left as `infer` in the optimization config are resolved
//! against a [`TrainerContext`] before the optimizer and scheduler are built.

mod capability;
mod context;
mod core;
mod optimization;


pub use capability::{
    ConfigSerializable, ParameterGrouped, Stage, StepContext, StepOutput, Trainable,
};
pub use context::{StepPlan, TrainerContext};
pub use core::Task;
pub use optimization::{
    build_lr_scheduler, build_optimizer_from, process_optim_config, ConfiguredOptimizers,
    SchedulerDescriptor,
};
