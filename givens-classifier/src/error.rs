use thiserror::Error;

pub type Result<T, E = ClassifierError> = std::result::Result<T, E>;

/// Problems with the run configuration. Always raised before training starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Network must have at least one layer")]
    NoLayers,
    #[error("Layer {layer} has output size 0")]
    EmptyLayer { layer: usize },
    #[error("Layer {layer} output size {size} exceeds its input width {dim}")]
    LayerTooWide {
        layer: usize,
        size: usize,
        dim: usize,
    },
    #[error("Final layer produces {logits} logits but there are {classes} classes")]
    ClassCountMismatch { logits: usize, classes: usize },
    #[error("Invalid digit subset {digits:?}: {reason}")]
    InvalidDigits { digits: Vec<u8>, reason: String },
    #[error("Cannot keep {requested} principal components of {available}-dimensional features")]
    InvalidComponents { requested: usize, available: usize },
    #[error("Invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to acquire '{url}': {message}")]
    DataAcquisition { url: String, message: String },
    #[error("Malformed data in '{file}': {reason}")]
    DataFormat { file: String, reason: String },
    #[error("Non-finite {what} at step {step}")]
    Numerical { step: usize, what: &'static str },
}

impl ClassifierError {
    /// True for failures worth retrying (network or storage hiccups).
    pub fn is_transient(&self) -> bool {
        matches!(self, ClassifierError::DataAcquisition { .. })
    }

    pub(crate) fn format(file: impl Into<String>, reason: impl Into<String>) -> Self {
        ClassifierError::DataFormat {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
