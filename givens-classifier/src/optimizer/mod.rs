mod rmsprop;
pub use rmsprop::RmsProp;

use crate::{
    error::{ClassifierError, Result},
    network::Network,
    objective::Objective,
    params::NetworkParameters,
};
use ndarray::ArrayView2;

/// Turns gradients into parameter updates.
///
/// Implementations own whatever accumulators they need; the returned updates
/// are added to the live parameters by the caller.
pub trait Optimizer {
    fn step(&mut self, gradients: &NetworkParameters) -> NetworkParameters;
}

/// `shadow += step_size * (live - shadow)`, elementwise.
pub fn incremental_update(
    live: &NetworkParameters,
    shadow: &mut NetworkParameters,
    step_size: f32,
) {
    shadow.zip_mut_with(live, |s, p| *s += step_size * (p - *s));
}

/// Live parameters, optimizer accumulators and the EMA shadow, advanced together.
pub struct TrainState<O: Optimizer> {
    pub params: NetworkParameters,
    pub shadow: NetworkParameters,
    pub optimizer: O,
    pub ema_step_size: f32,
}

impl<O: Optimizer> TrainState<O> {
    /// Starts with the shadow equal to the initial parameters.
    pub fn new(params: NetworkParameters, optimizer: O, ema_step_size: f32) -> Self {
        Self {
            shadow: params.clone(),
            params,
            optimizer,
            ema_step_size,
        }
    }

    /// One gradient step on a batch followed by the EMA update.
    ///
    /// Returns the batch loss evaluated at the parameters before the update.
    pub fn step(
        &mut self,
        network: &Network,
        objective: &Objective,
        features: ArrayView2<f32>,
        labels: ArrayView2<f32>,
        step: usize,
    ) -> Result<f32> {
        let (loss, gradients) = objective.loss_and_grad(network, &self.params, features, labels);
        if !loss.is_finite() {
            return Err(ClassifierError::Numerical { step, what: "loss" });
        }
        if !gradients.is_finite() {
            return Err(ClassifierError::Numerical {
                step,
                what: "gradient",
            });
        }

        let updates = self.optimizer.step(&gradients);
        self.params.apply_updates(&updates);
        incremental_update(&self.params, &mut self.shadow, self.ema_step_size);
        Ok(loss)
    }
}
