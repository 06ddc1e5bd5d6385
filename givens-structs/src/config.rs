use crate::serializable_struct_with_getters;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Pointwise nonlinearity applied after a rotation layer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Nonlinearity {
    Sigmoid,
    Selu,
    Relu,
    Tanh,
}

impl Nonlinearity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Nonlinearity::Sigmoid => "sigmoid",
            Nonlinearity::Selu => "selu",
            Nonlinearity::Relu => "relu",
            Nonlinearity::Tanh => "tanh",
        }
    }
}

impl fmt::Display for Nonlinearity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nonlinearity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigmoid" => Ok(Nonlinearity::Sigmoid),
            "selu" => Ok(Nonlinearity::Selu),
            "relu" => Ok(Nonlinearity::Relu),
            "tanh" => Ok(Nonlinearity::Tanh),
            _ => Err(format!(
                "Invalid nonlinearity '{}'. Expected one of: sigmoid, selu, relu, tanh",
                s
            )),
        }
    }
}

fn default_seed() -> u64 {
    123
}
fn default_batch_size() -> usize {
    50
}
fn default_n_components() -> usize {
    8
}
fn default_digits() -> Option<Vec<u8>> {
    Some(vec![6, 9])
}
fn default_output_sizes() -> Vec<usize> {
    vec![4, 2]
}
fn default_nonlinearity() -> Nonlinearity {
    Nonlinearity::Selu
}
fn default_learning_rate() -> f32 {
    0.001
}
fn default_rms_decay() -> f32 {
    0.9
}
fn default_rms_eps() -> f32 {
    1e-8
}
fn default_train_steps() -> usize {
    5000
}
fn default_ema_step_size() -> f32 {
    0.001
}
fn default_eval_interval() -> usize {
    100
}
fn default_l2_coefficient() -> f32 {
    1e-4
}
fn default_data_dir() -> String {
    "/tmp/".to_string()
}
fn default_base_url() -> String {
    "https://storage.googleapis.com/cvdf-datasets/mnist/".to_string()
}

serializable_struct_with_getters! {
    RunConfig {
        #[serde(default = "default_seed")]
        seed: u64,
        #[serde(default = "default_batch_size")]
        batch_size: usize,
        #[serde(default = "default_n_components")]
        n_components: usize,
        #[serde(default = "default_digits")]
        digits: Option<Vec<u8>>,
        #[serde(default = "default_output_sizes")]
        output_sizes: Vec<usize>,
        #[serde(default)]
        with_bias: bool,
        #[serde(default = "default_nonlinearity")]
        nonlinearity: Nonlinearity,
        #[serde(default)]
        activate_final: bool,
        #[serde(default)]
        normalize: bool,
        #[serde(default = "default_learning_rate")]
        learning_rate: f32,
        #[serde(default = "default_rms_decay")]
        rms_decay: f32,
        #[serde(default = "default_rms_eps")]
        rms_eps: f32,
        #[serde(default = "default_train_steps")]
        train_steps: usize,
        #[serde(default = "default_ema_step_size")]
        ema_step_size: f32,
        #[serde(default = "default_eval_interval")]
        eval_interval: usize,
        #[serde(default = "default_l2_coefficient")]
        l2_coefficient: f32,
        #[serde(default = "default_data_dir")]
        data_dir: String,
        #[serde(default = "default_base_url")]
        base_url: String,
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            batch_size: default_batch_size(),
            n_components: default_n_components(),
            digits: default_digits(),
            output_sizes: default_output_sizes(),
            with_bias: false,
            nonlinearity: default_nonlinearity(),
            activate_final: false,
            normalize: false,
            learning_rate: default_learning_rate(),
            rms_decay: default_rms_decay(),
            rms_eps: default_rms_eps(),
            train_steps: default_train_steps(),
            ema_step_size: default_ema_step_size(),
            eval_interval: default_eval_interval(),
            l2_coefficient: default_l2_coefficient(),
            data_dir: default_data_dir(),
            base_url: default_base_url(),
        }
    }
}

impl RunConfig {
    /// Number of classes the readout layer has to produce.
    pub fn num_classes(&self) -> usize {
        match &self.digits {
            Some(digits) => digits.len(),
            None => 10,
        }
    }
}
