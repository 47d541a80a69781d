//! Reduction modes shared by all losses

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::traits::LossValue;
use crate::error::Error;

/// How per-sample (or per-element) losses are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Return the unreduced values
    None,
    /// Average over all values
    #[default]
    Mean,
    /// Sum over all values
    Sum,
}

impl Reduction {
    /// Apply the reduction
    pub fn reduce(self, values: ArrayD<f32>) -> LossValue {
        match self {
            Self::None => LossValue::Unreduced(values),
            Self::Mean => LossValue::Scalar(values.mean().unwrap_or(f32::NAN)),
            Self::Sum => LossValue::Scalar(values.sum()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mean => "mean",
            Self::Sum => "sum",
        }
    }
}

impl FromStr for Reduction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            other => Err(Error::UnsupportedReduction(other.to_string())),
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
