use givens_classifier::{dataset::pca::Pca, ConfigError};
use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn anisotropic(rng: &mut StdRng, n: usize) -> Array2<f32> {
    let scales = [5.0f32, 3.0, 2.0, 1.0, 0.5];
    Array2::from_shape_fn((n, scales.len()), |(_, j)| {
        1.0 + scales[j] * rng.gen_range(-1.0f32..1.0)
    })
}

#[test]
fn test_recovers_direction_of_a_line() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut data = Array2::<f32>::zeros((40, 2));
    for mut row in data.rows_mut() {
        let t = rng.gen_range(-3.0f32..3.0);
        row[0] = 1.0 + 0.6 * t;
        row[1] = -2.0 + 0.8 * t;
    }
    let pca = Pca::fit(data.view(), 1).unwrap();
    let component = pca.components().row(0);
    assert!((component[0] - 0.6).abs() < 1e-4, "{}", component);
    assert!((component[1] - 0.8).abs() < 1e-4, "{}", component);
    let ratio = pca.explained_variance_ratio().unwrap();
    assert!((ratio[0] - 1.0).abs() < 1e-4);
}

#[test]
fn test_components_are_orthonormal_and_ordered() {
    let mut rng = StdRng::seed_from_u64(2);
    let data = anisotropic(&mut rng, 400);
    let pca = Pca::fit(data.view(), 3).unwrap();
    let c = pca.components();
    let gram = c.dot(&c.t());
    for i in 0..3 {
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((gram[[i, j]] - expected).abs() < 1e-6, "{}", gram);
        }
    }
    let variance = pca.explained_variance();
    assert!(variance[0] > variance[1] && variance[1] > variance[2]);
    for row in c.rows() {
        let pivot = row.iter().fold(0.0f64, |m, v| if v.abs() > m.abs() { *v } else { m });
        assert!(pivot > 0.0);
    }
}

#[test]
fn test_projection_is_centered_with_matching_variance() {
    let mut rng = StdRng::seed_from_u64(3);
    let data = anisotropic(&mut rng, 300);
    let pca = Pca::fit(data.view(), 2).unwrap();
    let projected = pca.transform(data.view());
    assert_eq!(projected.dim(), (300, 2));
    for (k, column) in projected.axis_iter(Axis(1)).enumerate() {
        let mean = column.sum() / 300.0;
        assert!(mean.abs() < 1e-3, "mean {}", mean);
        let variance = column.mapv(|v| (v as f64) * (v as f64)).sum() / 299.0;
        let expected = pca.explained_variance()[k];
        assert!(
            (variance - expected).abs() < 1e-3 * expected,
            "{} vs {}",
            variance,
            expected
        );
    }
}

#[test]
fn test_fit_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(4);
    let data = anisotropic(&mut rng, 100);
    let a = Pca::fit(data.view(), 4).unwrap();
    let b = Pca::fit(data.view(), 4).unwrap();
    assert_eq!(a.components(), b.components());
    assert_eq!(a.transform(data.view()), b.transform(data.view()));
}

#[test]
fn test_too_many_components_rejected() {
    let data = Array2::<f32>::zeros((10, 3));
    assert_eq!(
        Pca::fit(data.view(), 4).unwrap_err(),
        ConfigError::InvalidComponents {
            requested: 4,
            available: 3
        }
    );
    assert!(Pca::fit(data.view(), 0).is_err());
    assert!(Pca::fit(Array2::<f32>::zeros((2, 5)).view(), 3).is_err());
}
