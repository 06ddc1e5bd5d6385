use crate::{
    batches::BatchStream,
    dataset::{pca::Pca, select_digits, Dataset},
    error::{ConfigError, Result},
    network::Network,
    objective::{accuracy, Objective},
    optimizer::{Optimizer, RmsProp, TrainState},
};
use givens_structs::{
    config::RunConfig,
    core::{EvalRecord, RunReport},
};
use givens_utils::derive_seed;
use ndarray::ArrayView2;
use tracing::{debug, info};

/// Receives every evaluation as soon as it is made.
pub type Reporter<'a> = dyn FnMut(&EvalRecord) + 'a;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub steps_completed: usize,
    pub evaluations: Vec<EvalRecord>,
    /// Shadow-parameter accuracy on the test split after the last step.
    pub final_test_accuracy: f32,
}

/// Fixed-length training schedule for one network and objective.
#[derive(Debug, Clone)]
pub struct Trainer<'a> {
    pub network: &'a Network,
    pub objective: Objective,
    pub train_steps: usize,
    pub eval_interval: usize,
}

impl<'a> Trainer<'a> {
    /// Runs exactly `train_steps` optimizer steps.
    ///
    /// On steps that are a multiple of `eval_interval` the shadow parameters
    /// are scored on the batch just drawn and on the full test split before
    /// that step's update is applied.
    pub fn run<O: Optimizer>(
        &self,
        state: &mut TrainState<O>,
        batches: &mut BatchStream,
        test_features: ArrayView2<f32>,
        test_labels: ArrayView2<f32>,
        reporter: &mut Reporter,
    ) -> Result<TrainOutcome> {
        let mut evaluations =
            Vec::with_capacity(self.train_steps / self.eval_interval.max(1) + 1);
        for step in 0..self.train_steps {
            let (features, labels) = batches.next_batch();
            if self.eval_interval > 0 && step % self.eval_interval == 0 {
                let record = EvalRecord {
                    step,
                    train_accuracy: accuracy(
                        self.network,
                        &state.shadow,
                        features.view(),
                        labels.view(),
                    ),
                    test_accuracy: accuracy(
                        self.network,
                        &state.shadow,
                        test_features,
                        test_labels,
                    ),
                };
                reporter(&record);
                evaluations.push(record);
            }
            let loss = state.step(
                self.network,
                &self.objective,
                features.view(),
                labels.view(),
                step,
            )?;
            debug!("step {}: batch loss {:.5}", step, loss);
        }

        Ok(TrainOutcome {
            steps_completed: self.train_steps,
            evaluations,
            final_test_accuracy: accuracy(self.network, &state.shadow, test_features, test_labels),
        })
    }
}

/// Checks everything about `config` that does not depend on the data.
pub fn validate_config(config: &RunConfig) -> std::result::Result<(), ConfigError> {
    select_digits(config.digits.as_deref())?;
    if config.batch_size == 0 {
        return Err(ConfigError::InvalidSetting {
            name: "batch_size",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.eval_interval == 0 {
        return Err(ConfigError::InvalidSetting {
            name: "eval_interval",
            reason: "must be at least 1".to_string(),
        });
    }
    if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
        return Err(ConfigError::InvalidSetting {
            name: "learning_rate",
            reason: format!("must be a positive number, got {}", config.learning_rate),
        });
    }
    if !(0.0..1.0).contains(&config.rms_decay) {
        return Err(ConfigError::InvalidSetting {
            name: "rms_decay",
            reason: format!("must lie in [0, 1), got {}", config.rms_decay),
        });
    }
    if !(config.ema_step_size > 0.0 && config.ema_step_size <= 1.0) {
        return Err(ConfigError::InvalidSetting {
            name: "ema_step_size",
            reason: format!("must lie in (0, 1], got {}", config.ema_step_size),
        });
    }
    if !(config.l2_coefficient >= 0.0 && config.l2_coefficient.is_finite()) {
        return Err(ConfigError::InvalidSetting {
            name: "l2_coefficient",
            reason: format!("must be non-negative, got {}", config.l2_coefficient),
        });
    }
    match config.output_sizes.last() {
        None => return Err(ConfigError::NoLayers),
        Some(&logits) if logits != config.num_classes() => {
            return Err(ConfigError::ClassCountMismatch {
                logits,
                classes: config.num_classes(),
            })
        }
        Some(_) => {}
    }
    Ok(())
}

/// Projects both splits onto the principal components of the training split.
pub fn reduce_dimensions(dataset: Dataset, n_components: usize) -> Result<Dataset> {
    let pca = Pca::fit(dataset.train_features.view(), n_components)?;
    if let Some(ratio) = pca.explained_variance_ratio() {
        info!(
            "PCA keeps {} components explaining {:.1}% of training variance",
            n_components,
            100.0 * ratio.sum()
        );
    }
    Ok(Dataset {
        train_features: pca.transform(dataset.train_features.view()),
        test_features: pca.transform(dataset.test_features.view()),
        train_labels: dataset.train_labels,
        test_labels: dataset.test_labels,
    })
}

/// The whole recipe: PCA, network construction, RMSProp with an EMA shadow,
/// and the fixed-length loop.
pub fn train_classifier(
    config: &RunConfig,
    dataset: Dataset,
    reporter: &mut Reporter,
) -> Result<RunReport> {
    validate_config(config)?;
    let dataset = reduce_dimensions(dataset, config.n_components)?;

    let network = Network::from_config(dataset.input_dim(), config)?;
    if network.output_dim() != dataset.num_classes() {
        return Err(ConfigError::ClassCountMismatch {
            logits: network.output_dim(),
            classes: dataset.num_classes(),
        }
        .into());
    }
    let params = network.init_params(derive_seed(config.seed, "init"));
    info!(
        "network {} -> {:?} with {} parameters",
        network.input_dim(),
        config.output_sizes,
        params.num_scalars()
    );

    let optimizer = RmsProp::from_config(&params, config);
    let mut state = TrainState::new(params, optimizer, config.ema_step_size);
    let mut batches = BatchStream::new(
        dataset.train_features.view(),
        dataset.train_labels.view(),
        config.batch_size,
        derive_seed(config.seed, "batches"),
    )?;
    let trainer = Trainer {
        network: &network,
        objective: Objective::new(config.l2_coefficient),
        train_steps: config.train_steps,
        eval_interval: config.eval_interval,
    };
    let outcome = trainer.run(
        &mut state,
        &mut batches,
        dataset.test_features.view(),
        dataset.test_labels.view(),
        reporter,
    )?;
    info!(
        "finished {} steps ({} epochs), final test accuracy {:.3}",
        outcome.steps_completed,
        batches.epoch(),
        outcome.final_test_accuracy
    );

    Ok(RunReport {
        config: config.clone(),
        num_parameters: network.num_parameters(),
        steps_completed: outcome.steps_completed,
        evaluations: outcome.evaluations,
        final_test_accuracy: outcome.final_test_accuracy,
    })
}
