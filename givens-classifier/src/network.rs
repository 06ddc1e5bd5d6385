use crate::{
    error::ConfigError,
    layer::{LayerCache, RotationLayer},
    params::NetworkParameters,
};
use givens_structs::config::{Nonlinearity, RunConfig};
use ndarray::{Array2, ArrayView2};
use rand::{rngs::StdRng, SeedableRng};

/// Layer options shared by every layer of a network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkOptions {
    pub with_bias: bool,
    pub nonlinearity: Nonlinearity,
    pub activate_final: bool,
    pub normalize: bool,
}

impl From<&RunConfig> for NetworkOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            with_bias: config.with_bias,
            nonlinearity: config.nonlinearity,
            activate_final: config.activate_final,
            normalize: config.normalize,
        }
    }
}

/// A stack of rotation layers. Holds the static structure only; parameters
/// are passed in on every call.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<RotationLayer>,
}

impl Network {
    pub fn new(
        input_dim: usize,
        output_sizes: &[usize],
        options: &NetworkOptions,
    ) -> Result<Self, ConfigError> {
        if output_sizes.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        let mut layers = Vec::with_capacity(output_sizes.len());
        let mut dim = input_dim;
        for (l, &size) in output_sizes.iter().enumerate() {
            let is_last = l == output_sizes.len() - 1;
            let nonlinearity = (!is_last || options.activate_final).then_some(options.nonlinearity);
            layers.push(RotationLayer::new(
                l,
                dim,
                size,
                options.with_bias,
                nonlinearity,
                options.normalize,
            )?);
            dim = size;
        }
        Ok(Self { layers })
    }

    pub fn from_config(input_dim: usize, config: &RunConfig) -> Result<Self, ConfigError> {
        Self::new(input_dim, &config.output_sizes, &NetworkOptions::from(config))
    }

    pub fn layers(&self) -> &[RotationLayer] {
        &self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].dim
    }

    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].size
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(RotationLayer::num_parameters).sum()
    }

    pub fn init_params(&self, seed: [u8; 32]) -> NetworkParameters {
        let mut rng = StdRng::from_seed(seed);
        NetworkParameters {
            layers: self
                .layers
                .iter()
                .map(|layer| layer.init_params(&mut rng))
                .collect(),
        }
    }

    /// Computes the logits for a batch of feature rows.
    pub fn apply(&self, params: &NetworkParameters, input: ArrayView2<f32>) -> Array2<f32> {
        let mut x = input.to_owned();
        for (layer, p) in self.layers.iter().zip(params.layers.iter()) {
            x = layer.forward(p, x.view());
        }
        x
    }

    pub fn forward_with_cache(
        &self,
        params: &NetworkParameters,
        input: ArrayView2<f32>,
    ) -> (Array2<f32>, Vec<LayerCache>) {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut x = input.to_owned();
        for (layer, p) in self.layers.iter().zip(params.layers.iter()) {
            let (output, cache) = layer.forward_with_cache(p, x.view());
            caches.push(cache);
            x = output;
        }
        (x, caches)
    }

    /// Gradient of a scalar with respect to every parameter, given its
    /// gradient with respect to the logits.
    pub fn backward(
        &self,
        params: &NetworkParameters,
        caches: &[LayerCache],
        grad_logits: ArrayView2<f32>,
    ) -> NetworkParameters {
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut grad = grad_logits.to_owned();
        for l in (0..self.layers.len()).rev() {
            let (grad_input, layer_grads) =
                self.layers[l].backward(&params.layers[l], &caches[l], grad.view());
            grads.push(layer_grads);
            grad = grad_input;
        }
        grads.reverse();
        NetworkParameters { layers: grads }
    }
}
