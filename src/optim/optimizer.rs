//! Optimizer trait and the parameters it updates

use ndarray::Array1;

/// A named, flat parameter tensor with an optional gradient
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    data: Array1<f32>,
    grad: Option<Array1<f32>>,
    requires_grad: bool,
}

impl Parameter {
    /// Create a trainable parameter
    pub fn new(name: impl Into<String>, data: Array1<f32>) -> Self {
        Self { name: name.into(), data, grad: None, requires_grad: true }
    }

    pub fn zeros(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, Array1::zeros(len))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn grad(&self) -> Option<&Array1<f32>> {
        self.grad.as_ref()
    }

    pub fn set_grad(&mut self, grad: Array1<f32>) {
        self.grad = Some(grad);
    }

    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub fn set_requires_grad(&mut self, requires_grad: bool) {
        self.requires_grad = requires_grad;
    }

    /// Gradient to apply this step, if the parameter is trainable and has one
    pub(crate) fn trainable_grad(&self) -> Option<Array1<f32>> {
        if self.requires_grad {
            self.grad.clone()
        } else {
            None
        }
    }
}

/// Parameters sharing optimizer settings
///
/// `lr` and `weight_decay` override the optimizer defaults for this group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamGroup {
    pub name: String,
    pub params: Vec<Parameter>,
    pub lr: Option<f32>,
    pub weight_decay: Option<f32>,
}

impl ParamGroup {
    pub fn new(name: impl Into<String>, params: Vec<Parameter>) -> Self {
        Self { name: name.into(), params, lr: None, weight_decay: None }
    }

    pub fn with_lr(mut self, lr: f32) -> Self {
        self.lr = Some(lr);
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = Some(weight_decay);
        self
    }

    /// Number of trainable parameters in the group
    pub fn num_trainable(&self) -> usize {
        self.params.iter().filter(|p| p.requires_grad()).count()
    }
}

/// Per-group settings resolved against the optimizer defaults
///
/// The learning rate is kept as a ratio to the base rate so that a scheduler
/// setting the base rate moves every group proportionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GroupSettings {
    pub lr_scale: f32,
    pub weight_decay: f32,
}

impl GroupSettings {
    pub(crate) fn resolve(groups: &[ParamGroup], base_lr: f32, weight_decay: f32) -> Vec<Self> {
        groups
            .iter()
            .map(|g| Self {
                lr_scale: match g.lr {
                    Some(lr) if base_lr != 0.0 => lr / base_lr,
                    _ => 1.0,
                },
                weight_decay: g.weight_decay.unwrap_or(weight_decay),
            })
            .collect()
    }
}

/// Per-parameter optimizer state, indexed by group then parameter
pub(crate) type SlotState = Vec<Vec<Option<Array1<f32>>>>;

/// Fetch (or zero-initialize) the state slot of parameter `p` in group `g`
pub(crate) fn slot(state: &mut SlotState, g: usize, p: usize, len: usize) -> &mut Array1<f32> {
    if state.len() <= g {
        state.resize_with(g + 1, Vec::new);
    }
    let group = &mut state[g];
    if group.len() <= p {
        group.resize(p + 1, None);
    }
    group[p].get_or_insert_with(|| Array1::zeros(len))
}

/// Trait for optimization algorithms
pub trait Optimizer {
    /// Perform a single optimization step over every trainable parameter
    fn step(&mut self, groups: &mut [ParamGroup]);

    /// Clear all gradients
    fn zero_grad(&mut self, groups: &mut [ParamGroup]) {
        for param in groups.iter_mut().flat_map(|g| g.params.iter_mut()) {
            param.zero_grad();
        }
    }

    /// Base learning rate
    fn lr(&self) -> f32;

    /// Set the base learning rate; group overrides keep their ratio to it
    fn set_lr(&mut self, lr: f32);

    /// Effective learning rate of each group
    fn group_lrs(&self) -> Vec<f32>;

    /// Name of the optimizer
    fn name(&self) -> &str;
}
