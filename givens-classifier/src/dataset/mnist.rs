//! The MNIST handwritten digit set, stored as gzipped IDX files.
//!
//! IDX layout: a big-endian `u32` magic number (2049 for labels, 2051 for
//! images), a `u32` item count, for images `u32` rows and columns, then one
//! unsigned byte per label or pixel.

use super::{one_hot, select_digits, Dataset};
use crate::error::{ClassifierError, Result};
use givens_utils::{fetch_bytes, gunzip};
use ndarray::Array2;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte.gz";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte.gz";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte.gz";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte.gz";
pub const FILES: [&str; 4] = [TRAIN_IMAGES, TRAIN_LABELS, TEST_IMAGES, TEST_LABELS];

const LABELS_MAGIC: u32 = 2049;
const IMAGES_MAGIC: u32 = 2051;
const DOWNLOAD_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    /// Row-major pixels, `count * rows * cols` bytes.
    pub pixels: Vec<u8>,
}

impl IdxImages {
    pub fn pixels_per_image(&self) -> usize {
        self.rows * self.cols
    }
}

#[derive(Debug, Clone)]
pub struct RawMnist {
    pub train_images: IdxImages,
    pub train_labels: Vec<u8>,
    pub test_images: IdxImages,
    pub test_labels: Vec<u8>,
}

fn read_be_u32(file: &str, bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| ClassifierError::format(file, "truncated header"))
}

pub fn parse_labels(file: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    let magic = read_be_u32(file, bytes, 0)?;
    if magic != LABELS_MAGIC {
        return Err(ClassifierError::format(
            file,
            format!("expected label magic {}, found {}", LABELS_MAGIC, magic),
        ));
    }
    let count = read_be_u32(file, bytes, 4)? as usize;
    let body = &bytes[8..];
    if body.len() != count {
        return Err(ClassifierError::format(
            file,
            format!("header declares {} labels, found {}", count, body.len()),
        ));
    }
    Ok(body.to_vec())
}

pub fn parse_images(file: &str, bytes: &[u8]) -> Result<IdxImages> {
    let magic = read_be_u32(file, bytes, 0)?;
    if magic != IMAGES_MAGIC {
        return Err(ClassifierError::format(
            file,
            format!("expected image magic {}, found {}", IMAGES_MAGIC, magic),
        ));
    }
    let count = read_be_u32(file, bytes, 4)? as usize;
    let rows = read_be_u32(file, bytes, 8)? as usize;
    let cols = read_be_u32(file, bytes, 12)? as usize;
    let body = &bytes[16..];
    let expected = count
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(cols))
        .ok_or_else(|| ClassifierError::format(file, "image dimensions overflow"))?;
    if body.len() != expected {
        return Err(ClassifierError::format(
            file,
            format!(
                "header declares {} images of {}x{} ({} bytes), found {} bytes",
                count,
                rows,
                cols,
                expected,
                body.len()
            ),
        ));
    }
    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: body.to_vec(),
    })
}

fn read_gz(path: &Path) -> Result<Vec<u8>> {
    let compressed = fs::read(path).map_err(|e| ClassifierError::DataAcquisition {
        url: path.display().to_string(),
        message: e.to_string(),
    })?;
    gunzip(&compressed).map_err(|e| {
        ClassifierError::format(path.display().to_string(), format!("gzip: {}", e))
    })
}

/// Parses the four cached files in `data_dir`.
pub fn read_raw(data_dir: &Path) -> Result<RawMnist> {
    let raw = RawMnist {
        train_images: parse_images(TRAIN_IMAGES, &read_gz(&data_dir.join(TRAIN_IMAGES))?)?,
        train_labels: parse_labels(TRAIN_LABELS, &read_gz(&data_dir.join(TRAIN_LABELS))?)?,
        test_images: parse_images(TEST_IMAGES, &read_gz(&data_dir.join(TEST_IMAGES))?)?,
        test_labels: parse_labels(TEST_LABELS, &read_gz(&data_dir.join(TEST_LABELS))?)?,
    };
    for (images, labels, name) in [
        (&raw.train_images, &raw.train_labels, TRAIN_LABELS),
        (&raw.test_images, &raw.test_labels, TEST_LABELS),
    ] {
        if images.count != labels.len() {
            return Err(ClassifierError::format(
                name,
                format!("{} labels for {} images", labels.len(), images.count),
            ));
        }
    }
    if raw.train_images.pixels_per_image() != raw.test_images.pixels_per_image() {
        return Err(ClassifierError::format(
            TEST_IMAGES,
            "image size differs from the training images",
        ));
    }
    debug!(
        "parsed {} training and {} test images from {}",
        raw.train_images.count,
        raw.test_images.count,
        data_dir.display()
    );
    Ok(raw)
}

async fn download_with_retries(url: &str) -> Result<Vec<u8>> {
    let mut last_error = String::new();
    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        match fetch_bytes(url).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                warn!(
                    "download of {} failed (attempt {}/{}): {:#}",
                    url, attempt, DOWNLOAD_ATTEMPTS, e
                );
                last_error = format!("{:#}", e);
            }
        }
    }
    Err(ClassifierError::DataAcquisition {
        url: url.to_string(),
        message: format!("{} (gave up after {} attempts)", last_error, DOWNLOAD_ATTEMPTS),
    })
}

/// Downloads whichever of the four files are not cached in `data_dir` yet.
pub async fn download_missing(data_dir: &Path, base_url: &str) -> Result<()> {
    let storage_error = |path: &Path, e: std::io::Error| ClassifierError::DataAcquisition {
        url: path.display().to_string(),
        message: e.to_string(),
    };
    fs::create_dir_all(data_dir).map_err(|e| storage_error(data_dir, e))?;

    for name in FILES {
        let out_file = data_dir.join(name);
        if out_file.is_file() {
            continue;
        }
        let url = if base_url.ends_with('/') {
            format!("{}{}", base_url, name)
        } else {
            format!("{}/{}", base_url, name)
        };
        let bytes = download_with_retries(&url).await?;

        // a partial file must never look like a cached one
        let partial: PathBuf = data_dir.join(format!("{}.part", name));
        fs::write(&partial, &bytes).map_err(|e| storage_error(partial.as_path(), e))?;
        fs::rename(&partial, &out_file).map_err(|e| storage_error(out_file.as_path(), e))?;
        info!("downloaded {} to {}", url, data_dir.display());
    }
    Ok(())
}

fn select_split(images: &IdxImages, labels: &[u8], classes: &[u8]) -> (Array2<f32>, Array2<f32>) {
    let keep: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| classes.contains(*label))
        .map(|(i, _)| i)
        .collect();
    let n_pixels = images.pixels_per_image();
    let features = Array2::from_shape_fn((keep.len(), n_pixels), |(r, c)| {
        images.pixels[keep[r] * n_pixels + c] as f32 / 255.0
    });
    let kept_labels: Vec<u8> = keep.iter().map(|&i| labels[i]).collect();
    (features, one_hot(&kept_labels, classes))
}

/// Keeps the requested digits, flattens images and scales pixels to `[0, 1]`.
pub fn to_dataset(raw: &RawMnist, digits: Option<&[u8]>) -> Result<Dataset> {
    let classes = select_digits(digits)?;
    let (train_features, train_labels) =
        select_split(&raw.train_images, &raw.train_labels, &classes);
    let (test_features, test_labels) = select_split(&raw.test_images, &raw.test_labels, &classes);
    Ok(Dataset {
        train_features,
        train_labels,
        test_features,
        test_labels,
    })
}

/// Fetches (if needed), parses and filters MNIST.
pub async fn load_mnist(
    data_dir: &Path,
    base_url: &str,
    digits: Option<&[u8]>,
) -> Result<Dataset> {
    select_digits(digits)?;
    download_missing(data_dir, base_url).await?;
    let raw = read_raw(data_dir)?;
    let dataset = to_dataset(&raw, digits)?;
    info!(
        "loaded MNIST: {} train / {} test samples, {} classes",
        dataset.train_size(),
        dataset.test_size(),
        dataset.num_classes()
    );
    Ok(dataset)
}
