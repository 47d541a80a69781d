//! Constructor arguments passed from a loss config to a loss factory

use ndarray::Array1;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Name of the argument converted from a list into an `Array1<f32>`
pub const WEIGHT_ARG: &str = "weight";

/// Keyword arguments for a loss constructor.
///
/// `weight` is pulled out and converted to an array up front; everything else
/// stays as JSON and is deserialized by the loss into its own typed struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossArgs {
    weight: Option<Array1<f32>>,
    rest: Map<String, Value>,
}

impl LossArgs {
    /// Split raw `init_args`, converting a non-null `weight` list into an array
    pub fn from_init_args(init_args: Option<&Map<String, Value>>) -> Result<Self> {
        let mut rest = init_args.cloned().unwrap_or_default();
        let weight = match rest.remove(WEIGHT_ARG) {
            None | Some(Value::Null) => None,
            Some(value) => Some(weight_from_value(&value)?),
        };
        Ok(Self { weight, rest })
    }

    pub fn with_weight(mut self, weight: Array1<f32>) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn weight(&self) -> Option<&Array1<f32>> {
        self.weight.as_ref()
    }

    pub fn take_weight(&mut self) -> Option<Array1<f32>> {
        self.weight.take()
    }

    /// Deserialize the remaining arguments into `T` for the loss named `target`
    pub fn parse<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        serde_json::from_value(Value::Object(self.rest.clone()))
            .map_err(|e| Error::invalid_argument(target, e))
    }

    /// Fail if a weight was given to a loss that takes none
    pub fn reject_weight(&self, target: &str) -> Result<()> {
        if self.weight.is_some() {
            return Err(Error::invalid_argument(target, "unexpected argument 'weight'"));
        }
        Ok(())
    }
}

fn weight_from_value(value: &Value) -> Result<Array1<f32>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::invalid_argument(WEIGHT_ARG, "expected a list of numbers"))?;
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|x| x as f32)
                .ok_or_else(|| Error::invalid_argument(WEIGHT_ARG, format!("'{v}' is not a number")))
        })
        .collect::<Result<Vec<f32>>>()
        .map(Array1::from)
}
