//! Loss function trait and its input/output types

use ndarray::{Array1, ArrayD, ArrayView2, Ix2};

use crate::error::{Error, Result};

/// Ground truth handed to a loss
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Class indices, shape `(N)`
    Classes(Array1<usize>),
    /// Dense targets with the same shape as the input (probabilities, one-hot, regression values)
    Dense(ArrayD<f32>),
}

impl Target {
    /// Class index targets from a plain vector
    pub fn classes(indices: Vec<usize>) -> Self {
        Self::Classes(Array1::from(indices))
    }

    /// Number of samples in the batch
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Classes(t) => t.len(),
            Self::Dense(t) => t.shape().first().copied().unwrap_or(0),
        }
    }
}

impl From<Array1<usize>> for Target {
    fn from(t: Array1<usize>) -> Self {
        Self::Classes(t)
    }
}

impl From<ArrayD<f32>> for Target {
    fn from(t: ArrayD<f32>) -> Self {
        Self::Dense(t)
    }
}

/// Output of a loss
#[derive(Debug, Clone, PartialEq)]
pub enum LossValue {
    /// Reduced value (`mean` / `sum`)
    Scalar(f32),
    /// Unreduced values (`none`), per sample or per element
    Unreduced(ArrayD<f32>),
}

impl LossValue {
    /// The reduced value, if this is a scalar
    pub fn scalar(&self) -> Option<f32> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Unreduced(_) => None,
        }
    }

    /// The unreduced values, if any
    pub fn unreduced(&self) -> Option<&ArrayD<f32>> {
        match self {
            Self::Scalar(_) => None,
            Self::Unreduced(v) => Some(v),
        }
    }

    /// `a * self + b * other`, for two values of the same kind
    pub(crate) fn blend(self, a: f32, other: Self, b: f32) -> Result<Self> {
        match (self, other) {
            (Self::Scalar(x), Self::Scalar(y)) => Ok(Self::Scalar(a * x + b * y)),
            (Self::Unreduced(x), Self::Unreduced(y)) if x.shape() == y.shape() => {
                Ok(Self::Unreduced(x * a + y * b))
            }
            _ => Err(Error::ShapeMismatch("cannot blend reduced and unreduced losses".into())),
        }
    }
}

/// Trait for loss functions
pub trait LossFn {
    /// Compute the loss of `input` against `target`
    fn forward(&self, input: &ArrayD<f32>, target: &Target) -> Result<LossValue>;

    /// Name of the loss function
    fn name(&self) -> &str;

    /// Per-class rescaling weight, for losses that take one
    fn weight(&self) -> Option<&Array1<f32>> {
        None
    }
}

/// View `input` as a `(N, C)` matrix
pub(crate) fn as_matrix(input: &ArrayD<f32>) -> Result<ArrayView2<'_, f32>> {
    if input.ndim() < 2 {
        return Err(Error::ShapeMismatch(format!(
            "Invalid input shape, we expect BxC. Got: {:?}",
            input.shape()
        )));
    }
    input.view().into_dimensionality::<Ix2>().map_err(|_| {
        Error::ShapeMismatch(format!("Expected a (N, C) input. Got: {:?}", input.shape()))
    })
}

/// Class targets checked against an `(N, C)` input
pub(crate) fn class_targets<'a>(
    input: &ArrayView2<'_, f32>,
    target: &'a Target,
) -> Result<&'a Array1<usize>> {
    let Target::Classes(t) = target else {
        return Err(Error::ShapeMismatch("expected class index targets of shape (N)".into()));
    };
    let (n, c) = input.dim();
    if t.len() != n {
        return Err(Error::ShapeMismatch(format!(
            "Expected input batch_size ({n}) to match target batch_size ({}).",
            t.len()
        )));
    }
    if let Some(&bad) = t.iter().find(|&&k| k >= c) {
        return Err(Error::ShapeMismatch(format!("target {bad} is out of bounds for {c} classes")));
    }
    Ok(t)
}

/// Dense targets checked to have exactly the input's shape
pub(crate) fn dense_targets<'a>(input: &ArrayD<f32>, target: &'a Target) -> Result<&'a ArrayD<f32>> {
    let Target::Dense(t) = target else {
        return Err(Error::ShapeMismatch("expected dense targets with the input's shape".into()));
    };
    if t.shape() != input.shape() {
        return Err(Error::ShapeMismatch(format!(
            "target shape {:?} does not match input shape {:?}",
            t.shape(),
            input.shape()
        )));
    }
    Ok(t)
}

/// Per-class weight checked against the class count
pub(crate) fn check_weight(weight: Option<&Array1<f32>>, num_classes: usize) -> Result<()> {
    match weight {
        Some(w) if w.len() != num_classes => Err(Error::ShapeMismatch(format!(
            "weight has {} entries but input has {num_classes} classes",
            w.len()
        ))),
        _ => Ok(()),
    }
}
