use super::Optimizer;
use crate::params::NetworkParameters;
use givens_structs::config::RunConfig;
use ndarray::Zip;

/// RMSProp: scales each gradient by a running root-mean-square of its history.
///
/// `eps` sits inside the square root, so a gradient far below `sqrt(eps)`
/// yields a step proportional to it rather than one of size `lr`.
#[derive(Debug, Clone)]
pub struct RmsProp {
    pub learning_rate: f32,
    pub decay: f32,
    pub eps: f32,
    mean_square: NetworkParameters,
}

impl RmsProp {
    /// Accumulators start at zero with the same shape as `params`.
    pub fn new(params: &NetworkParameters, learning_rate: f32, decay: f32, eps: f32) -> Self {
        Self {
            learning_rate,
            decay,
            eps,
            mean_square: params.zeros_like(),
        }
    }

    pub fn from_config(params: &NetworkParameters, config: &RunConfig) -> Self {
        Self::new(
            params,
            config.learning_rate,
            config.rms_decay,
            config.rms_eps,
        )
    }

    pub fn mean_square(&self) -> &NetworkParameters {
        &self.mean_square
    }
}

impl Optimizer for RmsProp {
    fn step(&mut self, gradients: &NetworkParameters) -> NetworkParameters {
        let mut updates = gradients.zeros_like();
        let (lr, decay, eps) = (self.learning_rate, self.decay, self.eps);
        for ((update, nu), grad) in updates
            .tensors_mut()
            .zip(self.mean_square.tensors_mut())
            .zip(gradients.tensors())
        {
            Zip::from(update).and(nu).and(grad).for_each(|u, nu, &g| {
                *nu = decay * *nu + (1.0 - decay) * g * g;
                *u = -lr * g / (*nu + eps).sqrt();
            });
        }
        updates
    }
}
