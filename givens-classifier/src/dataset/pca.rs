//! Principal component analysis used as a fixed linear preprocessing step.
//!
//! Components are the leading eigenvectors of the training covariance,
//! extracted one at a time by power iteration with deflation. Arithmetic is
//! done in `f64`; projected features are handed back as `f32`.

use crate::error::ConfigError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use tracing::debug;

const MAX_ITER: usize = 1000;
const TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// One unit-length component per row, by decreasing variance.
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    total_variance: f64,
}

impl Pca {
    /// Fits on `features` (one sample per row). Only ever call this on the
    /// training split; the test split is projected with the same fit.
    pub fn fit(features: ArrayView2<f32>, n_components: usize) -> Result<Self, ConfigError> {
        let (n_samples, n_features) = features.dim();
        let available = n_samples.min(n_features);
        if n_components == 0 || n_components > available {
            return Err(ConfigError::InvalidComponents {
                requested: n_components,
                available,
            });
        }

        let x = features.mapv(f64::from);
        let mean = x.sum_axis(Axis(0)) / n_samples as f64;
        let centered = &x - &mean;
        let mut cov = centered.t().dot(&centered) / (n_samples.max(2) - 1) as f64;
        let total_variance = cov.diag().sum();

        let mut components = Array2::zeros((n_components, n_features));
        let mut explained_variance = Array1::zeros(n_components);
        for k in 0..n_components {
            let (value, vector) = dominant_eigenpair(&cov, k);
            let column = vector.view().insert_axis(Axis(1));
            let row = vector.view().insert_axis(Axis(0));
            cov.scaled_add(-value, &column.dot(&row));
            components.row_mut(k).assign(&vector);
            explained_variance[k] = value;
        }
        debug!(
            "fitted {} principal components on {} samples, explained variance {:.4} of {:.4}",
            n_components,
            n_samples,
            explained_variance.sum(),
            total_variance
        );

        Ok(Self {
            mean,
            components,
            explained_variance,
            total_variance,
        })
    }

    pub fn transform(&self, features: ArrayView2<f32>) -> Array2<f32> {
        let centered = features.mapv(f64::from) - &self.mean;
        centered.dot(&self.components.t()).mapv(|v| v as f32)
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> Option<Array1<f64>> {
        (self.total_variance > 1e-12).then(|| &self.explained_variance / self.total_variance)
    }
}

/// Largest eigenvalue of a symmetric matrix and its eigenvector.
///
/// The eigenvector's largest-magnitude entry is made positive so fits are
/// reproducible.
fn dominant_eigenpair(matrix: &Array2<f64>, k: usize) -> (f64, Array1<f64>) {
    let n = matrix.nrows();
    let mut v = Array1::from_shape_fn(n, |i| 1.0 + ((i + k) % 7) as f64 * 0.1);
    let start_norm = v.dot(&v).sqrt();
    v /= start_norm;

    for _ in 0..MAX_ITER {
        let w = matrix.dot(&v);
        let norm = w.dot(&w).sqrt();
        if norm <= f64::EPSILON {
            // remaining variance is exhausted
            return (0.0, v);
        }
        let next = w / norm;
        let delta = next
            .iter()
            .zip(v.iter())
            .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()));
        v = next;
        if delta < TOLERANCE {
            break;
        }
    }

    let pivot = v
        .iter()
        .enumerate()
        .fold((0, 0.0f64), |best, (i, &x)| {
            if x.abs() > best.1 {
                (i, x.abs())
            } else {
                best
            }
        })
        .0;
    if v[pivot] < 0.0 {
        v.mapv_inplace(|x| -x);
    }
    let value = v.dot(&matrix.dot(&v));
    (value, v)
}
