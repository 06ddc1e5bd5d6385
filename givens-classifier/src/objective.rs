use crate::{network::Network, params::NetworkParameters};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Zip};

/// L2-regularised softmax cross-entropy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    pub l2_coefficient: f32,
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            l2_coefficient: 1e-4,
        }
    }
}

impl Objective {
    pub fn new(l2_coefficient: f32) -> Self {
        Self { l2_coefficient }
    }

    pub fn loss(
        &self,
        network: &Network,
        params: &NetworkParameters,
        features: ArrayView2<f32>,
        labels: ArrayView2<f32>,
    ) -> f32 {
        let logits = network.apply(params, features);
        softmax_cross_entropy(logits.view(), labels) + self.l2_coefficient * l2_penalty(params)
    }

    pub fn loss_and_grad(
        &self,
        network: &Network,
        params: &NetworkParameters,
        features: ArrayView2<f32>,
        labels: ArrayView2<f32>,
    ) -> (f32, NetworkParameters) {
        let (logits, caches) = network.forward_with_cache(params, features);
        let loss = softmax_cross_entropy(logits.view(), labels)
            + self.l2_coefficient * l2_penalty(params);

        let grad_logits = softmax_cross_entropy_grad(logits.view(), labels);
        let mut grads = network.backward(params, &caches, grad_logits.view());
        let l2 = self.l2_coefficient;
        grads.zip_mut_with(params, |g, p| *g += l2 * p);
        (loss, grads)
    }
}

/// Half the sum of squares of every parameter.
pub fn l2_penalty(params: &NetworkParameters) -> f32 {
    0.5 * params.sum_of_squares()
}

pub fn log_softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let log_sum = row.fold(0.0f32, |acc, &v| acc + (v - max).exp()).ln() + max;
        row.mapv_inplace(|v| v - log_sum);
    }
    out
}

/// `-sum(labels * log_softmax(logits)) / batch`.
pub fn softmax_cross_entropy(logits: ArrayView2<f32>, labels: ArrayView2<f32>) -> f32 {
    let batch = logits.nrows().max(1) as f32;
    let log_probs = log_softmax(logits);
    -Zip::from(&log_probs)
        .and(labels)
        .fold(0.0f32, |acc, &lp, &y| acc + y * lp)
        / batch
}

pub fn softmax_cross_entropy_grad(logits: ArrayView2<f32>, labels: ArrayView2<f32>) -> Array2<f32> {
    let batch = logits.nrows().max(1) as f32;
    let mut grad = log_softmax(logits);
    for (mut g, y) in grad.axis_iter_mut(Axis(0)).zip(labels.axis_iter(Axis(0))) {
        let label_mass = y.sum();
        Zip::from(&mut g)
            .and(&y)
            .for_each(|g, &y| *g = (g.exp() * label_mass - y) / batch);
    }
    grad
}

/// Index of the first maximum.
pub fn argmax(row: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// Fraction of rows whose highest logit matches the label's hot index.
pub fn accuracy_from_logits(logits: ArrayView2<f32>, labels: ArrayView2<f32>) -> f32 {
    if logits.nrows() == 0 {
        return 0.0;
    }
    let hits = logits
        .axis_iter(Axis(0))
        .zip(labels.axis_iter(Axis(0)))
        .filter(|(l, y)| argmax(l.view()) == argmax(y.view()))
        .count();
    hits as f32 / logits.nrows() as f32
}

pub fn accuracy(
    network: &Network,
    params: &NetworkParameters,
    features: ArrayView2<f32>,
    labels: ArrayView2<f32>,
) -> f32 {
    accuracy_from_logits(network.apply(params, features).view(), labels)
}
