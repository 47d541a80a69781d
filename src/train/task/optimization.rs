//! Resolving an optimization config and building its optimizer and scheduler

use std::fmt;

use serde_json::Value;
use tracing::Level;

use super::context::{StepPlan, TrainerContext};
use crate::config::{Interval, OptimizationConfig, OptimizerSpec, Resolvable, SchedulerSpec, INFER};
use crate::error::Result;
use crate::logging::log_main_process;
use crate::optim::{build_optimizer, build_scheduler, LRScheduler, Optimizer, ParamGroup};

/// Scheduler init args filled from the step plan when set to `"infer"`
const INFERRED_SCHEDULER_ARGS: [&str; 4] = ["max_iters", "epochs", "steps_per_epoch", "max_steps"];

fn planned_value(plan: &StepPlan, key: &str) -> Option<usize> {
    match key {
        "max_iters" | "max_steps" => Some(plan.max_steps),
        "epochs" => Some(plan.max_epochs),
        "steps_per_epoch" => Some(plan.steps_per_epoch),
        _ => None,
    }
}

/// Fill every `infer` field of `config` from the trainer
///
/// Explicit values in the config are kept. Scheduler init args named
/// `max_iters`, `epochs`, `steps_per_epoch` or `max_steps` that hold the
/// `"infer"` marker take the trainer-derived value.
pub fn process_optim_config(
    config: &OptimizationConfig,
    trainer: &TrainerContext,
) -> Result<OptimizationConfig> {
    let plan = trainer.num_training_steps()?;
    let mut config = config.clone();

    config.steps_per_epoch = resolve(config.steps_per_epoch, plan.steps_per_epoch);
    config.max_steps = resolve(config.max_steps, plan.max_steps);
    config.max_epochs = resolve(config.max_epochs, plan.max_epochs);

    if let Some(init_args) = config.scheduler.init_args.as_mut() {
        for key in INFERRED_SCHEDULER_ARGS {
            let Some(value) = planned_value(&plan, key) else { continue };
            if let Some(slot) = init_args.get_mut(key).filter(|v| is_infer_marker(v)) {
                *slot = Value::from(value);
                log_main_process(
                    trainer.global_rank,
                    Level::DEBUG,
                    format!("Set the value of '{key}' to be {value}."),
                );
            }
        }
    }

    Ok(config)
}

fn resolve(value: Resolvable<usize>, inferred: usize) -> Resolvable<usize> {
    Resolvable::Value(value.resolve_or(inferred))
}

fn is_infer_marker(value: &Value) -> bool {
    value.as_str() == Some(INFER)
}

/// Build the optimizer named by `spec`, or nothing when it names none
pub fn build_optimizer_from(
    spec: &OptimizerSpec,
    groups: &[ParamGroup],
    rank: usize,
) -> Result<Option<Box<dyn Optimizer>>> {
    let Some(name) = spec.name.as_deref() else {
        log_main_process(
            rank,
            Level::WARN,
            "Optimizer is None, therefore no optimizer will be created.",
        );
        return Ok(None);
    };

    let optimizer = build_optimizer(name, spec.init_args.as_ref(), groups)?;
    log_main_process(rank, Level::DEBUG, format!("Created optimizer: {}", optimizer.name()));
    Ok(Some(optimizer))
}

/// Build the scheduler named by `spec` around `optimizer`
///
/// A `max_lr` init arg is always replaced with `max_lr`, whatever the config
/// says.
pub fn build_lr_scheduler(
    spec: &SchedulerSpec,
    optimizer: &dyn Optimizer,
    max_lr: f32,
    rank: usize,
) -> Result<Option<SchedulerDescriptor>> {
    let Some(name) = spec.name.as_deref() else {
        log_main_process(rank, Level::INFO, "scheduler is None, so no scheduler will be created.");
        return Ok(None);
    };

    let mut init_args = spec.init_args.clone().unwrap_or_default();
    if let Some(slot) = init_args.get_mut("max_lr") {
        *slot = Value::from(max_lr);
    }

    let scheduler = build_scheduler(name, Some(&init_args), optimizer)?;
    log_main_process(rank, Level::DEBUG, format!("Created lr_scheduler : {}.", scheduler.name()));

    Ok(Some(SchedulerDescriptor {
        scheduler,
        interval: spec.interval,
        monitor: spec.monitor.clone(),
    }))
}

/// A scheduler together with when the trainer should step it
pub struct SchedulerDescriptor {
    pub scheduler: Box<dyn LRScheduler>,
    pub interval: Interval,
    pub monitor: Option<String>,
}

impl SchedulerDescriptor {
    /// Step the scheduler if `interval` matches its own, then push its rate
    pub fn step_on(&mut self, interval: Interval, optimizer: &mut dyn Optimizer) {
        if interval == self.interval {
            self.scheduler.step();
            self.scheduler.apply(optimizer);
        }
    }
}

impl fmt::Debug for SchedulerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerDescriptor")
            .field("scheduler", &self.scheduler.name())
            .field("lr", &self.scheduler.get_lr())
            .field("interval", &self.interval)
            .field("monitor", &self.monitor)
            .finish()
    }
}

/// What a task hands to the trainer
pub enum ConfiguredOptimizers {
    /// No optimizer; the model is used for inference only
    None,
    Optimizer(Box<dyn Optimizer>),
    WithScheduler { optimizer: Box<dyn Optimizer>, scheduler: SchedulerDescriptor },
}

impl ConfiguredOptimizers {
    pub fn optimizer(&self) -> Option<&dyn Optimizer> {
        match self {
            Self::None => None,
            Self::Optimizer(optimizer) | Self::WithScheduler { optimizer, .. } => {
                Some(optimizer.as_ref())
            }
        }
    }

    pub fn scheduler(&self) -> Option<&SchedulerDescriptor> {
        match self {
            Self::WithScheduler { scheduler, .. } => Some(scheduler),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for ConfiguredOptimizers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Optimizer(optimizer) => f.debug_tuple("Optimizer").field(&optimizer.name()).finish(),
            Self::WithScheduler { optimizer, scheduler } => f
                .debug_struct("WithScheduler")
                .field("optimizer", &optimizer.name())
                .field("scheduler", scheduler)
                .finish(),
        }
    }
}
