use crate::{
    activation::{activate, activate_grad},
    error::ConfigError,
    params::LayerParameters,
    wires::{Wire, WireSchedule},
};
use givens_structs::config::Nonlinearity;
use ndarray::{s, Array1, Array2, ArrayView2, Axis, Zip};
use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};
use std::f32::consts::PI;

/// A Givens rotation cascade from `dim` coordinates down to `size`.
#[derive(Debug, Clone)]
pub struct RotationLayer {
    pub dim: usize,
    pub size: usize,
    pub schedule: WireSchedule,
    pub with_bias: bool,
    pub nonlinearity: Option<Nonlinearity>,
    pub normalize: bool,
}

/// Intermediate values recorded by a forward pass, consumed by `backward`.
#[derive(Debug, Clone, Default)]
pub struct LayerCache {
    norms: Option<Array1<f32>>,
    /// Post-rotation columns `(low, high)` of every wire, in schedule order.
    tape: Vec<(Array1<f32>, Array1<f32>)>,
    pre_activation: Option<Array2<f32>>,
}

/// Rotates columns `low` and `high` of `x` by `theta`, in place.
pub fn rotate_pair(x: &mut Array2<f32>, wire: Wire, theta: f32) {
    let (sin_t, cos_t) = theta.sin_cos();
    let (mut low, mut high) = x.multi_slice_mut((s![.., wire.low], s![.., wire.high]));
    Zip::from(&mut low).and(&mut high).for_each(|a, b| {
        let (a0, b0) = (*a, *b);
        *a = cos_t * a0 - sin_t * b0;
        *b = sin_t * a0 + cos_t * b0;
    });
}

pub fn row_norms(x: &Array2<f32>) -> Array1<f32> {
    x.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

impl RotationLayer {
    pub fn new(
        index: usize,
        dim: usize,
        size: usize,
        with_bias: bool,
        nonlinearity: Option<Nonlinearity>,
        normalize: bool,
    ) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::EmptyLayer { layer: index });
        }
        if size > dim {
            return Err(ConfigError::LayerTooWide {
                layer: index,
                size,
                dim,
            });
        }
        Ok(Self {
            dim,
            size,
            schedule: WireSchedule::new(dim, size),
            with_bias,
            nonlinearity,
            normalize,
        })
    }

    pub fn num_parameters(&self) -> usize {
        self.schedule.len() + if self.with_bias { self.size } else { 0 }
    }

    /// Angles uniform in `[-pi, pi]`, bias zero.
    pub fn init_params<R: Rng>(&self, rng: &mut R) -> LayerParameters {
        let angle_distr = Uniform::new_inclusive(-PI, PI);
        LayerParameters {
            angles: (0..self.schedule.len())
                .map(|_| angle_distr.sample(rng))
                .collect(),
            bias: self.with_bias.then(|| Array1::zeros(self.size)),
        }
    }

    pub fn forward(&self, params: &LayerParameters, input: ArrayView2<f32>) -> Array2<f32> {
        self.propagate(params, input, None)
    }

    pub fn forward_with_cache(
        &self,
        params: &LayerParameters,
        input: ArrayView2<f32>,
    ) -> (Array2<f32>, LayerCache) {
        let mut cache = LayerCache {
            tape: Vec::with_capacity(self.schedule.len()),
            ..Default::default()
        };
        let output = self.propagate(params, input, Some(&mut cache));
        (output, cache)
    }

    fn propagate(
        &self,
        params: &LayerParameters,
        input: ArrayView2<f32>,
        mut cache: Option<&mut LayerCache>,
    ) -> Array2<f32> {
        debug_assert_eq!(input.ncols(), self.dim);
        debug_assert_eq!(params.angles.len(), self.schedule.len());

        let mut x = input.to_owned();
        if self.normalize {
            // the norm is a constant as far as the backward pass is concerned
            let norms = row_norms(&x);
            x /= &norms.view().insert_axis(Axis(1));
            if let Some(cache) = cache.as_deref_mut() {
                cache.norms = Some(norms);
            }
        }

        for (wire, &theta) in self.schedule.iter().zip(params.angles.iter()) {
            rotate_pair(&mut x, *wire, theta);
            if let Some(cache) = cache.as_deref_mut() {
                cache
                    .tape
                    .push((x.column(wire.low).to_owned(), x.column(wire.high).to_owned()));
            }
        }

        let mut output = x.slice(s![.., self.dim - self.size..]).to_owned();
        if let Some(bias) = &params.bias {
            output += bias;
        }
        if let Some(kind) = self.nonlinearity {
            if let Some(cache) = cache.as_deref_mut() {
                cache.pre_activation = Some(output.clone());
            }
            output.mapv_inplace(|v| activate(kind, v));
        }
        output
    }

    /// Propagates `grad_output` back through the layer.
    ///
    /// Returns the gradient with respect to the layer input and the gradient
    /// with respect to the layer parameters.
    pub fn backward(
        &self,
        params: &LayerParameters,
        cache: &LayerCache,
        grad_output: ArrayView2<f32>,
    ) -> (Array2<f32>, LayerParameters) {
        let mut grad = grad_output.to_owned();
        if let (Some(kind), Some(pre)) = (self.nonlinearity, &cache.pre_activation) {
            Zip::from(&mut grad)
                .and(pre)
                .for_each(|g, &p| *g *= activate_grad(kind, p));
        }
        let bias_grad = params.bias.as_ref().map(|_| grad.sum_axis(Axis(0)));

        let mut grad_x = Array2::<f32>::zeros((grad.nrows(), self.dim));
        grad_x
            .slice_mut(s![.., self.dim - self.size..])
            .assign(&grad);

        // d(theta) = sum(g_high * c - g_low * d) over the post-rotation pair (c, d);
        // the input gradient is the transposed rotation of the output gradient.
        let mut angle_grads = Array1::<f32>::zeros(self.schedule.len());
        for idx in (0..self.schedule.len()).rev() {
            let wire = self.schedule[idx];
            let (sin_t, cos_t) = params.angles[idx].sin_cos();
            let (rotated_low, rotated_high) = &cache.tape[idx];
            let (mut g_low, mut g_high) =
                grad_x.multi_slice_mut((s![.., wire.low], s![.., wire.high]));
            let mut d_theta = 0.0f32;
            Zip::from(&mut g_low)
                .and(&mut g_high)
                .and(rotated_low)
                .and(rotated_high)
                .for_each(|gl, gh, &c, &d| {
                    let (l, h) = (*gl, *gh);
                    d_theta += h * c - l * d;
                    *gl = cos_t * l + sin_t * h;
                    *gh = -sin_t * l + cos_t * h;
                });
            angle_grads[idx] = d_theta;
        }

        if let Some(norms) = &cache.norms {
            grad_x /= &norms.view().insert_axis(Axis(1));
        }

        (
            grad_x,
            LayerParameters {
                angles: angle_grads,
                bias: bias_grad,
            },
        )
    }
}
