//! Loss registry and builder
//!
//! A loss config names a loss and carries its keyword arguments:
//!
//! ```yaml
//! loss:
//!   name: FocalLoss
//!   init_args:
//!     gamma: 2.0
//! ```
//!
//! [`LossRegistry::build`] looks the name up in the registry first and in the
//! [`standard`](super::standard) namespace second.

use std::sync::{LazyLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::args::LossArgs;
use super::binary_focal::BinarySigmoidFocalLoss;
use super::focal::FocalLoss;
use super::label_smoothing::LabelSmoothingCrossEntropy;
use super::soft_target::SoftTargetCrossEntropy;
use super::standard;
use super::traits::LossFn;
use crate::error::{Error, Result};
use crate::registry::Registry;

/// Constructor of a loss from its keyword arguments
pub type LossFactory = fn(LossArgs) -> Result<Box<dyn LossFn>>;

/// Name and keyword arguments of a loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_args: Option<Map<String, Value>>,
}

impl LossSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), init_args: None }
    }

    /// Add one keyword argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.init_args.get_or_insert_with(Map::new).insert(key.into(), value.into());
        self
    }
}

/// Losses registered by [`LossRegistry::with_builtins`]
pub const BUILTIN_LOSSES: [(&str, LossFactory); 4] = [
    ("BinarySigmoidFocalLoss", BinarySigmoidFocalLoss::from_args),
    ("FocalLoss", FocalLoss::from_args),
    ("LabelSmoothingCrossEntropy", LabelSmoothingCrossEntropy::from_args),
    ("SoftTargetCrossEntropy", SoftTargetCrossEntropy::from_args),
];

/// Name-keyed table of loss factories
#[derive(Debug, Clone)]
pub struct LossRegistry {
    inner: Registry<LossFactory>,
}

impl Default for LossRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl LossRegistry {
    pub const NAME: &'static str = "Loss Registry";

    /// An empty registry; only standard losses resolve
    pub fn new() -> Self {
        Self { inner: Registry::new(Self::NAME) }
    }

    /// A registry holding the built-in losses
    pub fn with_builtins() -> Self {
        Self { inner: Registry::with_entries(Self::NAME, BUILTIN_LOSSES) }
    }

    /// Register a custom loss. Fails with `DuplicateName` if taken.
    pub fn register(&mut self, name: impl Into<String>, factory: LossFactory) -> Result<()> {
        self.inner.register(name, factory)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    /// Registered names in sorted order (standard losses not included)
    pub fn names(&self) -> Vec<String> {
        self.inner.names().map(str::to_string).collect()
    }

    /// Find the factory for `name`, registry first, then the standard namespace
    pub fn resolve(&self, name: &str) -> Option<LossFactory> {
        self.inner.get(name).copied().or_else(|| standard::lookup(name))
    }

    /// Construct the loss described by `spec`
    pub fn build(&self, spec: &LossSpec) -> Result<Box<dyn LossFn>> {
        let factory =
            self.resolve(&spec.name).ok_or_else(|| Error::UnknownLoss(spec.name.clone()))?;
        let args = LossArgs::from_init_args(spec.init_args.as_ref())?;
        let loss = factory(args)?;
        info!("Built loss function: {}", loss.name());
        Ok(loss)
    }
}

static LOSS_REGISTRY: LazyLock<RwLock<LossRegistry>> =
    LazyLock::new(|| RwLock::new(LossRegistry::with_builtins()));

/// The process-wide loss registry
pub fn global_registry() -> &'static RwLock<LossRegistry> {
    &LOSS_REGISTRY
}

/// Register a custom loss in the process-wide registry
pub fn register_loss(name: impl Into<String>, factory: LossFactory) -> Result<()> {
    LOSS_REGISTRY.write().unwrap_or_else(PoisonError::into_inner).register(name, factory)
}

/// Build a loss through the process-wide registry
pub fn build_loss(spec: &LossSpec) -> Result<Box<dyn LossFn>> {
    LOSS_REGISTRY.read().unwrap_or_else(PoisonError::into_inner).build(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::loss::{LossValue, Target};
    use ndarray::{array, ArrayD};
    use serde_json::json;

    struct ConstantLoss;

    impl LossFn for ConstantLoss {
        fn forward(&self, _input: &ArrayD<f32>, _target: &Target) -> Result<LossValue> {
            Ok(LossValue::Scalar(1.0))
        }

        fn name(&self) -> &'static str {
            "ConstantLoss"
        }
    }

    fn constant(_args: LossArgs) -> Result<Box<dyn LossFn>> {
        Ok(Box::new(ConstantLoss))
    }

    #[test]
    fn test_builtins_registered() {
        let registry = LossRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec![
                "BinarySigmoidFocalLoss",
                "FocalLoss",
                "LabelSmoothingCrossEntropy",
                "SoftTargetCrossEntropy"
            ]
        );
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = LossRegistry::with_builtins();
        let err = registry.register("FocalLoss", constant).err().expect("expected an error");
        assert!(matches!(err, Error::DuplicateName { ref name, .. } if name == "FocalLoss"));
    }

    #[test]
    fn test_unknown_loss() {
        let err = LossRegistry::with_builtins().build(&LossSpec::new("Nope")).err().expect("expected an error");
        assert!(matches!(err, Error::UnknownLoss(ref n) if n == "Nope"));
        assert!(err.to_string().contains("nor is it a standard loss"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = LossRegistry::with_builtins();
        assert!(registry.build(&LossSpec::new("focalloss")).is_err());
        assert!(registry.build(&LossSpec::new("FocalLoss")).is_ok());
    }

    #[test]
    fn test_standard_fallback() {
        let loss = LossRegistry::new().build(&LossSpec::new("CrossEntropyLoss")).unwrap();
        assert_eq!(loss.name(), "CrossEntropyLoss");
    }

    #[test]
    fn test_registry_shadows_standard() {
        let mut registry = LossRegistry::new();
        registry.register("MSELoss", constant).unwrap();
        let loss = registry.build(&LossSpec::new("MSELoss")).unwrap();
        assert_eq!(loss.name(), "ConstantLoss");
    }

    #[test]
    fn test_weight_list_becomes_array() {
        let spec = LossSpec::new("LabelSmoothingCrossEntropy").with_arg("weight", json!([1.0, 2.0]));
        let loss = LossRegistry::with_builtins().build(&spec).unwrap();
        assert_eq!(loss.weight().unwrap(), &array![1.0f32, 2.0]);
    }

    #[test]
    fn test_null_weight_ignored() {
        let spec = LossSpec::new("CrossEntropyLoss").with_arg("weight", Value::Null);
        let loss = LossRegistry::new().build(&spec).unwrap();
        assert!(loss.weight().is_none());
    }

    #[test]
    fn test_bad_init_args() {
        let spec = LossSpec::new("FocalLoss").with_arg("gama", 2.0);
        let err = LossRegistry::with_builtins().build(&spec).err().expect("expected an error");
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let spec = LossSpec::new("FocalLoss").with_arg("reduction", "avg");
        let err = LossRegistry::with_builtins().build(&spec).err().expect("expected an error");
        assert!(matches!(err, Error::UnsupportedReduction(_)));
    }

    #[test]
    fn test_spec_deserializes_without_init_args() {
        let spec: LossSpec = serde_yaml::from_str("name: FocalLoss\n").unwrap();
        assert_eq!(spec, LossSpec::new("FocalLoss"));
        let spec: LossSpec = serde_yaml::from_str("name: FocalLoss\ninit_args: null\n").unwrap();
        assert!(spec.init_args.is_none());
    }

    #[test]
    fn test_global_registry() {
        register_loss("GlobalConstantLoss", constant).unwrap();
        assert!(register_loss("GlobalConstantLoss", constant).is_err());
        let loss = build_loss(&LossSpec::new("GlobalConstantLoss")).unwrap();
        assert_eq!(loss.name(), "ConstantLoss");
        assert!(global_registry().read().unwrap().contains("FocalLoss"));
    }
}
