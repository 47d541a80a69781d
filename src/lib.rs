//! Vendaval: training conveniences for image classification
//!
//! - [`data`] - class-per-directory scanning, stratified folds, label encoding
//! - [`train`] - loss registry and the task base that resolves optimization configs
//! - [`optim`] - optimizers, learning rate schedulers and their registries
//! - [`config`] - typed YAML/JSON task configuration
//! - [`logging`] - rank-aware console logging
//!
//! # Example
//!
//! ```
//! use vendaval::train::TrainerContext;
//!
//! let trainer = TrainerContext::new(500).with_max_steps(1000);
//! let plan = trainer.num_training_steps()?;
//! assert_eq!(plan.steps_per_epoch, 500);
//! assert_eq!(plan.max_epochs, 2);
//! # Ok::<(), vendaval::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod optim;
pub mod registry;
pub mod train;

pub use error::{Error, Result};
