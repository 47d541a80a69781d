//! Classification losses and the registry that builds them from config
//!
//! - [`LabelSmoothingCrossEntropy`] - cross entropy blended with a uniform target
//! - [`FocalLoss`] - multi-class focal loss on softmax probabilities
//! - [`BinarySigmoidFocalLoss`] - focal loss on independent sigmoid outputs
//! - [`SoftTargetCrossEntropy`] - cross entropy against probability targets
//!
//! Names not found in a [`LossRegistry`] fall back to the [`standard`] losses
//! ([`CrossEntropyLoss`], [`NLLLoss`], [`BCEWithLogitsLoss`], [`MSELoss`],
//! [`L1Loss`]).

mod args;
mod binary_focal;
mod cross_entropy;
mod focal;
mod label_smoothing;
mod reduction;
mod registry;
mod soft_target;
pub mod standard;
mod traits;

pub use args::{LossArgs, WEIGHT_ARG};
pub use binary_focal::BinarySigmoidFocalLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use focal::FocalLoss;
pub use label_smoothing::LabelSmoothingCrossEntropy;
pub use reduction::Reduction;
pub use registry::{
    build_loss, global_registry, register_loss, LossFactory, LossRegistry, LossSpec,
    BUILTIN_LOSSES,
};
pub use soft_target::SoftTargetCrossEntropy;
pub use standard::{BCEWithLogitsLoss, L1Loss, MSELoss, NLLLoss};
pub use traits::{LossFn, LossValue, Target};
