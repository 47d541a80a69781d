//! Training-side building blocks
//!
//! This module provides:
//! - Loss functions and the loss registry (Cross-Entropy, Label Smoothing, Focal)
//! - The task base that resolves an optimization config against a trainer
//! - Capability traits a model implements to be driven by a task
//!
//! # Example
//!
//! ```
//! use vendaval::train::{build_loss, LossSpec, Target};
//! use ndarray::array;
//!
//! let loss = build_loss(&LossSpec::new("LabelSmoothingCrossEntropy").with_arg("eps", 0.1))?;
//! let logits = array![[2.0f32, 0.5, -1.0], [0.1, 1.5, 0.3]].into_dyn();
//! let value = loss.forward(&logits, &Target::classes(vec![0, 1]))?;
//! assert!(value.scalar().unwrap() > 0.0);
//! # Ok::<(), vendaval::Error>(())
//! ```

pub mod loss;
pub mod task;

pub use loss::{
    build_loss, global_registry, register_loss, BCEWithLogitsLoss, BinarySigmoidFocalLoss,
    CrossEntropyLoss, FocalLoss, L1Loss, LabelSmoothingCrossEntropy, LossArgs, LossFactory,
    LossFn, LossRegistry, LossSpec, LossValue, MSELoss, NLLLoss, Reduction,
    SoftTargetCrossEntropy, Target, BUILTIN_LOSSES, WEIGHT_ARG,
};
pub use task::{
    build_lr_scheduler, build_optimizer_from, process_optim_config, ConfigSerializable,
    ConfiguredOptimizers, ParameterGrouped, SchedulerDescriptor, Stage, StepContext, StepOutput,
    StepPlan, Task, Trainable, TrainerContext,
};
