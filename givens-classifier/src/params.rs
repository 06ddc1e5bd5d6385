use ndarray::{Array1, Zip};
use std::iter;

/// Trainable state of one rotation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParameters {
    /// One angle per wire of the layer's schedule, in schedule order.
    pub angles: Array1<f32>,
    /// Offset added to the coordinates the layer keeps.
    pub bias: Option<Array1<f32>>,
}

impl LayerParameters {
    pub fn zeros_like(&self) -> Self {
        Self {
            angles: Array1::zeros(self.angles.len()),
            bias: self.bias.as_ref().map(|b| Array1::zeros(b.len())),
        }
    }

    pub fn tensors(&self) -> impl Iterator<Item = &Array1<f32>> {
        iter::once(&self.angles).chain(self.bias.iter())
    }

    pub fn tensors_mut(&mut self) -> impl Iterator<Item = &mut Array1<f32>> {
        iter::once(&mut self.angles).chain(self.bias.iter_mut())
    }
}

/// Parameters of the whole network, one entry per layer in order.
///
/// Gradients, optimizer accumulators, updates and the EMA shadow all share
/// this shape, so elementwise arithmetic between them is a zip over tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParameters {
    pub layers: Vec<LayerParameters>,
}

impl NetworkParameters {
    pub fn zeros_like(&self) -> Self {
        Self {
            layers: self.layers.iter().map(LayerParameters::zeros_like).collect(),
        }
    }

    pub fn tensors(&self) -> impl Iterator<Item = &Array1<f32>> {
        self.layers.iter().flat_map(|layer| layer.tensors())
    }

    pub fn tensors_mut(&mut self) -> impl Iterator<Item = &mut Array1<f32>> {
        self.layers.iter_mut().flat_map(|layer| layer.tensors_mut())
    }

    pub fn num_scalars(&self) -> usize {
        self.tensors().map(|t| t.len()).sum()
    }

    pub fn sum_of_squares(&self) -> f32 {
        self.tensors().map(|t| t.dot(t)).sum()
    }

    pub fn is_finite(&self) -> bool {
        self.tensors().all(|t| t.iter().all(|v| v.is_finite()))
    }

    /// Calls `f(self_value, other_value)` for every scalar pair.
    pub fn zip_mut_with(&mut self, other: &NetworkParameters, mut f: impl FnMut(&mut f32, f32)) {
        debug_assert_eq!(self.layers.len(), other.layers.len());
        for (mine, theirs) in self.tensors_mut().zip(other.tensors()) {
            Zip::from(mine).and(theirs).for_each(|a, &b| f(a, b));
        }
    }

    /// Adds `updates` in place.
    pub fn apply_updates(&mut self, updates: &NetworkParameters) {
        self.zip_mut_with(updates, |p, u| *p += u);
    }
}
