pub mod activation;
pub mod batches;
pub mod dataset;
pub mod error;
pub mod layer;
pub mod network;
pub mod objective;
pub mod optimizer;
pub mod params;
pub mod training;
pub mod wires;

pub use error::{ClassifierError, ConfigError, Result};
pub use network::{Network, NetworkOptions};
pub use params::{LayerParameters, NetworkParameters};
pub use training::{train_classifier, Trainer};
pub use wires::{Wire, WireSchedule};
