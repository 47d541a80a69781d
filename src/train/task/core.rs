//! Core Task struct and its step hooks

use std::collections::BTreeMap;

use tracing::Level;

use super::capability::{ConfigSerializable, ParameterGrouped, Stage, StepContext, Trainable};
use super::context::{StepPlan, TrainerContext};
use super::optimization::{
    build_lr_scheduler, build_optimizer_from, process_optim_config, ConfiguredOptimizers,
    SchedulerDescriptor,
};
use crate::config::{OptimizationConfig, TaskConfig};
use crate::error::{Error, Result};
use crate::logging::log_main_process;
use crate::optim::Optimizer;
use crate::train::{build_loss, LossFn};

/// Wraps a model with the loss, optimizer and scheduler its config names
///
/// A task built without a [`TrainerContext`] is being restored for
/// inference; attaching a trainer switches it to training.
///
/// # Example
///
/// ```no_run
/// use vendaval::config::TaskConfig;
/// use vendaval::train::{ConfiguredOptimizers, Task, TrainerContext};
/// # use vendaval::train::{ParameterGrouped, StepContext, StepOutput, Trainable};
/// # use vendaval::optim::ParamGroup;
/// # struct Model(Vec<ParamGroup>);
/// # impl ParameterGrouped for Model {
/// #     fn param_groups(&self) -> &[ParamGroup] { &self.0 }
/// #     fn param_groups_mut(&mut self) -> &mut [ParamGroup] { &mut self.0 }
/// # }
/// # impl Trainable for Model {
/// #     type Batch = ();
/// #     fn shared_step(&mut self, _: &(), _: &StepContext<'_>) -> vendaval::Result<StepOutput> {
/// #         Ok(StepOutput::new(0.0))
/// #     }
/// # }
///
/// let config: TaskConfig = vendaval::config::load_config("task.yaml")?;
/// let trainer = TrainerContext::new(500).with_max_epochs(10);
/// let mut task = Task::new(config, Model(Vec::new()), Some(trainer))?;
///
/// if let ConfiguredOptimizers::WithScheduler { optimizer, scheduler } = task.configure_optimizers()? {
///     println!("{} driven by {:?}", optimizer.name(), scheduler);
/// }
/// # Ok::<(), vendaval::Error>(())
/// ```
pub struct Task<M> {
    config: TaskConfig,
    model: M,
    trainer: Option<TrainerContext>,
    loss: Option<Box<dyn LossFn>>,
    optimizer: Option<Box<dyn Optimizer>>,
    scheduler: Option<SchedulerDescriptor>,
    resolved: Option<OptimizationConfig>,
    optimization_ready: bool,
    logged: BTreeMap<String, f32>,
    is_restored: bool,
}

impl<M> Task<M> {
    /// Create a task; builds the loss named in `config.loss`
    pub fn new(config: TaskConfig, model: M, trainer: Option<TrainerContext>) -> Result<Self> {
        let loss = config.loss.as_ref().map(build_loss).transpose()?;
        let is_restored = trainer.is_none();
        Ok(Self {
            config,
            model,
            trainer,
            loss,
            optimizer: None,
            scheduler: None,
            resolved: None,
            optimization_ready: false,
            logged: BTreeMap::new(),
            is_restored,
        })
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn trainer(&self) -> Option<&TrainerContext> {
        self.trainer.as_ref()
    }

    /// Attach a trainer; the task is no longer being restored
    pub fn attach_trainer(&mut self, trainer: TrainerContext) {
        self.trainer = Some(trainer);
        self.is_restored = false;
    }

    pub fn loss(&self) -> Option<&dyn LossFn> {
        self.loss.as_deref()
    }

    pub fn set_loss(&mut self, loss: Box<dyn LossFn>) {
        self.loss = Some(loss);
    }

    /// Whether the model is being restored for inference rather than trained
    pub fn is_restored(&self) -> bool {
        self.is_restored
    }

    pub fn set_restored(&mut self, restored: bool) {
        self.is_restored = restored;
    }

    pub fn optimizer(&self) -> Option<&dyn Optimizer> {
        self.optimizer.as_deref()
    }

    pub fn scheduler(&self) -> Option<&SchedulerDescriptor> {
        self.scheduler.as_ref()
    }

    /// The optimization config after the last [`Task::setup_optimization`]
    pub fn resolved_optimization(&self) -> Option<&OptimizationConfig> {
        self.resolved.as_ref()
    }

    /// Latest value of every logged key
    pub fn logged_metrics(&self) -> &BTreeMap<String, f32> {
        &self.logged
    }

    fn rank(&self) -> usize {
        self.trainer.as_ref().map_or(0, |t| t.global_rank)
    }

    fn require_trainer(&self) -> Result<&TrainerContext> {
        self.trainer.as_ref().ok_or_else(|| {
            Error::config("A trainer is required to infer the number of training steps")
        })
    }

    /// Step budget inferred from the attached trainer
    pub fn num_training_steps(&self) -> Result<StepPlan> {
        self.require_trainer()?.num_training_steps()
    }

    /// Fill the `infer` fields of `config` from the attached trainer
    pub fn process_optim_config(&self, config: &OptimizationConfig) -> Result<OptimizationConfig> {
        process_optim_config(config, self.require_trainer()?)
    }

    /// Record `values` under `prefix/`
    pub fn log_dict(&mut self, prefix: &str, values: &BTreeMap<String, f32>) {
        for (key, value) in values {
            self.logged.insert(format!("{prefix}/{key}"), *value);
        }
    }
}

impl<M: ParameterGrouped> Task<M> {
    /// Build the optimizer and scheduler
    ///
    /// `conf` defaults to the task config's `optimization` section. With no
    /// config at all, or no optimizer name, nothing is built and a warning is
    /// logged.
    pub fn setup_optimization(&mut self, conf: Option<OptimizationConfig>) -> Result<()> {
        let rank = self.rank();
        let Some(conf) = conf.or_else(|| self.config.optimization.clone()) else {
            log_main_process(
                rank,
                Level::WARN,
                "No optimization config found, therefore no optimizer was created",
            );
            self.optimizer = None;
            self.scheduler = None;
            self.optimization_ready = true;
            return Ok(());
        };

        let resolved = self.process_optim_config(&conf)?;
        let optimizer = build_optimizer_from(&resolved.optimizer, self.model.param_groups(), rank)?;
        let scheduler = match optimizer.as_deref() {
            Some(optimizer) => {
                let max_lr = self.model.max_lr().unwrap_or(self.config.model.lr);
                build_lr_scheduler(&resolved.scheduler, optimizer, max_lr, rank)?
            }
            None => None,
        };

        self.optimizer = optimizer;
        self.scheduler = scheduler;
        self.resolved = Some(resolved);
        self.optimization_ready = true;
        Ok(())
    }

    /// Hand the optimizer and scheduler over to the trainer
    ///
    /// Runs [`Task::setup_optimization`] first unless it was already called.
    pub fn configure_optimizers(&mut self) -> Result<ConfiguredOptimizers> {
        if !self.optimization_ready {
            self.setup_optimization(None)?;
        }
        self.optimization_ready = false;

        Ok(match (self.optimizer.take(), self.scheduler.take()) {
            (None, _) => ConfiguredOptimizers::None,
            (Some(optimizer), None) => ConfiguredOptimizers::Optimizer(optimizer),
            (Some(optimizer), Some(scheduler)) => {
                ConfiguredOptimizers::WithScheduler { optimizer, scheduler }
            }
        })
    }
}

impl<M: Trainable> Task<M> {
    fn run_step(&mut self, batch: &M::Batch, batch_idx: usize, stage: Stage) -> Result<f32> {
        let ctx = StepContext { stage, batch_idx, loss: self.loss.as_deref() };
        let output = self.model.shared_step(batch, &ctx)?;
        self.log_dict(stage.log_prefix(), &output.logs);
        Ok(output.loss)
    }

    /// Run a training step; returns the loss to optimize
    pub fn training_step(&mut self, batch: &M::Batch, batch_idx: usize) -> Result<f32> {
        self.run_step(batch, batch_idx, Stage::Train)
    }

    pub fn validation_step(&mut self, batch: &M::Batch, batch_idx: usize) -> Result<()> {
        self.run_step(batch, batch_idx, Stage::Validation).map(|_| ())
    }

    pub fn test_step(&mut self, batch: &M::Batch, batch_idx: usize) -> Result<()> {
        self.run_step(batch, batch_idx, Stage::Test).map(|_| ())
    }
}

impl<M: ConfigSerializable> Task<M> {
    /// Create a task whose model is rebuilt from `model_config`
    pub fn from_model_config(
        config: TaskConfig,
        model_config: M::Config,
        trainer: Option<TrainerContext>,
    ) -> Result<Self> {
        Self::new(config, M::from_config(model_config)?, trainer)
    }

    /// Config of the wrapped model
    pub fn model_config(&self) -> M::Config {
        self.model.to_config()
    }
}
