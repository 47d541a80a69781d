//! Declarative task configuration
//!
//! A [`TaskConfig`] names the loss, optimizer and scheduler of a task together
//! with the step budget, which may be left as `infer` and resolved later
//! against the trainer.

mod loader;
pub mod schema;
pub mod validate;

pub use loader::{load_config, parse_json, parse_yaml};
pub use schema::{
    BatchLimit, DataConfig, Interval, ModelHypers, OptimizationConfig, OptimizerSpec, Resolvable,
    SchedulerSpec, TaskConfig, TrainerConfig, INFER,
};
pub use validate::{validate_config, ValidationError};
