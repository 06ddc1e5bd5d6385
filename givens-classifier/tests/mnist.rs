use flate2::{write::GzEncoder, Compression};
use givens_classifier::{
    dataset::{
        mnist::{self, parse_images, parse_labels, read_raw, to_dataset},
        select_digits,
    },
    ClassifierError, ConfigError,
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

fn labels_file(labels: &[u8]) -> Vec<u8> {
    let mut bytes = 2049u32.to_be_bytes().to_vec();
    bytes.extend((labels.len() as u32).to_be_bytes());
    bytes.extend(labels);
    bytes
}

fn images_file(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
    let mut bytes = 2051u32.to_be_bytes().to_vec();
    for v in [count, rows, cols] {
        bytes.extend(v.to_be_bytes());
    }
    bytes.extend(pixels);
    bytes
}

fn gz(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("givens-mnist-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Writes a tiny 2x2-pixel dataset: image `i` is filled with `i * 50`.
fn write_fixture(dir: &Path) {
    let train_labels = [3u8, 1, 4, 1, 5];
    let train_pixels: Vec<u8> = (0..5u8).flat_map(|i| [i * 50; 4]).collect();
    let test_labels = [1u8, 3, 9];
    let test_pixels: Vec<u8> = (0..3u8).flat_map(|i| [i * 50; 4]).collect();
    let files = [
        (mnist::TRAIN_IMAGES, images_file(5, 2, 2, &train_pixels)),
        (mnist::TRAIN_LABELS, labels_file(&train_labels)),
        (mnist::TEST_IMAGES, images_file(3, 2, 2, &test_pixels)),
        (mnist::TEST_LABELS, labels_file(&test_labels)),
    ];
    for (name, bytes) in files {
        fs::write(dir.join(name), gz(&bytes)).unwrap();
    }
}

#[test]
fn test_parse_labels() {
    assert_eq!(
        parse_labels("labels", &labels_file(&[7, 0, 9])).unwrap(),
        vec![7, 0, 9]
    );
}

#[test]
fn test_parse_images() {
    let images = parse_images("images", &images_file(2, 1, 3, &[1, 2, 3, 4, 5, 6])).unwrap();
    assert_eq!((images.count, images.rows, images.cols), (2, 1, 3));
    assert_eq!(images.pixels_per_image(), 3);
    assert_eq!(images.pixels, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_format_errors() {
    let wrong_magic = images_file(1, 1, 1, &[0]);
    assert!(matches!(
        parse_labels("labels", &wrong_magic),
        Err(ClassifierError::DataFormat { .. })
    ));
    assert!(matches!(
        parse_images("images", &labels_file(&[1])),
        Err(ClassifierError::DataFormat { .. })
    ));
    assert!(matches!(
        parse_labels("labels", &[0, 0, 8]),
        Err(ClassifierError::DataFormat { .. })
    ));
    let mut short = labels_file(&[1, 2, 3]);
    short.pop();
    let err = parse_labels("labels", &short).unwrap_err();
    assert!(matches!(err, ClassifierError::DataFormat { ref file, .. } if file == "labels"));
    assert!(!err.is_transient());
    assert!(matches!(
        parse_images("images", &images_file(2, 2, 2, &[0; 7])),
        Err(ClassifierError::DataFormat { .. })
    ));
}

#[test]
fn test_read_raw_and_select_digits() {
    let dir = scratch_dir("select");
    write_fixture(&dir);
    let raw = read_raw(&dir).unwrap();
    assert_eq!(raw.train_labels, vec![3, 1, 4, 1, 5]);
    assert_eq!(raw.test_images.count, 3);

    // one-hot columns follow the requested order
    let dataset = to_dataset(&raw, Some(&[3, 1])).unwrap();
    assert_eq!(dataset.train_size(), 3);
    assert_eq!(dataset.test_size(), 2);
    assert_eq!(dataset.input_dim(), 4);
    assert_eq!(dataset.num_classes(), 2);
    assert_eq!(dataset.train_labels.row(0).to_vec(), vec![1.0, 0.0]);
    assert_eq!(dataset.train_labels.row(1).to_vec(), vec![0.0, 1.0]);
    assert_eq!(dataset.train_features.row(1).to_vec(), vec![50.0 / 255.0; 4]);
    assert_eq!(dataset.train_features.row(2).to_vec(), vec![150.0 / 255.0; 4]);
    assert!(dataset.train_features.iter().all(|v| (0.0..=1.0).contains(v)));

    let all = to_dataset(&raw, None).unwrap();
    assert_eq!((all.train_size(), all.num_classes()), (5, 10));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_files_are_acquisition_errors() {
    let dir = scratch_dir("missing");
    let err = read_raw(&dir).unwrap_err();
    assert!(matches!(err, ClassifierError::DataAcquisition { .. }));
    assert!(err.is_transient());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_corrupt_gzip_is_format_error() {
    let dir = scratch_dir("corrupt");
    write_fixture(&dir);
    fs::write(dir.join(mnist::TEST_LABELS), b"not gzip").unwrap();
    let err = read_raw(&dir).unwrap_err();
    assert!(matches!(err, ClassifierError::DataFormat { .. }));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_label_image_count_mismatch() {
    let dir = scratch_dir("mismatch");
    write_fixture(&dir);
    fs::write(dir.join(mnist::TEST_LABELS), gz(&labels_file(&[1, 3]))).unwrap();
    assert!(matches!(
        read_raw(&dir),
        Err(ClassifierError::DataFormat { .. })
    ));
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_cached_files_are_not_downloaded() {
    let dir = scratch_dir("cached");
    write_fixture(&dir);
    // nothing listens on the discard port; any request would fail
    mnist::download_missing(&dir, "http://127.0.0.1:9/").await.unwrap();
    let dataset = mnist::load_mnist(&dir, "http://127.0.0.1:9/", Some(&[1]))
        .await
        .unwrap();
    assert_eq!(dataset.train_size(), 2);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_digit_subsets() {
    assert_eq!(select_digits(None).unwrap(), (0..10).collect::<Vec<u8>>());
    assert_eq!(select_digits(Some(&[6, 9])).unwrap(), vec![6, 9]);
    for bad in [&[][..], &[10][..], &[6, 6][..]] {
        assert!(matches!(
            select_digits(Some(bad)),
            Err(ConfigError::InvalidDigits { .. })
        ));
    }
}
