use crate::{config::RunConfig, serializable_struct_with_getters};
use serde::{Deserialize, Serialize};
use std::fmt;

serializable_struct_with_getters! {
    EvalRecord {
        step: usize,
        train_accuracy: f32,
        test_accuracy: f32,
    }
}

impl fmt::Display for EvalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Step {}] Train / Test accuracy: {:.3} / {:.3}.",
            self.step, self.train_accuracy, self.test_accuracy
        )
    }
}

serializable_struct_with_getters! {
    RunReport {
        config: RunConfig,
        num_parameters: usize,
        steps_completed: usize,
        evaluations: Vec<EvalRecord>,
        final_test_accuracy: f32,
    }
}
