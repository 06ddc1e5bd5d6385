use givens_classifier::{batches::BatchStream, ConfigError};
use ndarray::Array2;

fn split(n: usize) -> (Array2<f32>, Array2<f32>) {
    (
        Array2::from_shape_fn((n, 1), |(i, _)| i as f32),
        Array2::from_shape_fn((n, 1), |(i, _)| 2.0 * i as f32),
    )
}

#[test]
fn test_each_epoch_visits_every_sample_once() {
    let (features, labels) = split(23);
    let mut stream = BatchStream::new(features.view(), labels.view(), 5, [1; 32]).unwrap();
    assert_eq!(stream.batches_per_epoch(), 5);
    for epoch in 1..=3 {
        let mut seen = Vec::new();
        let mut sizes = Vec::new();
        for _ in 0..stream.batches_per_epoch() {
            let indices = stream.next_indices();
            sizes.push(indices.len());
            seen.extend(indices);
        }
        assert_eq!(stream.epoch(), epoch);
        assert_eq!(sizes, vec![5, 5, 5, 5, 3]);
        seen.sort();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());
    }
}

#[test]
fn test_batches_keep_features_and_labels_aligned() {
    let (features, labels) = split(17);
    let stream = BatchStream::new(features.view(), labels.view(), 4, [2; 32]).unwrap();
    for (x, y) in stream.take(12) {
        assert_eq!(x.nrows(), y.nrows());
        for (a, b) in x.iter().zip(y.iter()) {
            assert_eq!(*b, 2.0 * a);
        }
    }
}

#[test]
fn test_same_seed_same_batches() {
    let (features, labels) = split(30);
    let a: Vec<_> = BatchStream::new(features.view(), labels.view(), 7, [3; 32])
        .unwrap()
        .take(20)
        .collect();
    let b: Vec<_> = BatchStream::new(features.view(), labels.view(), 7, [3; 32])
        .unwrap()
        .take(20)
        .collect();
    let c: Vec<_> = BatchStream::new(features.view(), labels.view(), 7, [4; 32])
        .unwrap()
        .take(20)
        .collect();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_batch_larger_than_split() {
    let (features, labels) = split(3);
    let mut stream = BatchStream::new(features.view(), labels.view(), 10, [5; 32]).unwrap();
    assert_eq!(stream.batches_per_epoch(), 1);
    assert_eq!(stream.next_batch().0.nrows(), 3);
    assert_eq!(stream.next_batch().0.nrows(), 3);
    assert_eq!(stream.epoch(), 2);
}

#[test]
fn test_invalid_streams_rejected() {
    let (features, labels) = split(3);
    assert!(matches!(
        BatchStream::new(features.view(), labels.view(), 0, [0; 32]),
        Err(ConfigError::InvalidSetting {
            name: "batch_size",
            ..
        })
    ));
    let (features, labels) = split(0);
    assert!(BatchStream::new(features.view(), labels.view(), 4, [0; 32]).is_err());
}
