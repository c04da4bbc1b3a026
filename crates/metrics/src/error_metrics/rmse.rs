//! Root mean squared error.

use crate::error_metrics::{per_user_differences, Coverage, ErrorStrategy};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Root mean squared error between predictions and test preferences.
///
/// Identical structure to MAE with squared differences and a sqrt
/// applied per user and globally; the global mean square is
/// count-weighted before the root.
pub struct Rmse {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    strategy: ErrorStrategy,
    per_user: BTreeMap<UserId, f64>,
    coverage: Coverage,
    value: f64,
    computed: bool,
}

impl Rmse {
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        strategy: ErrorStrategy,
    ) -> Self {
        Self {
            predictions,
            test,
            strategy,
            per_user: BTreeMap::new(),
            coverage: Coverage::default(),
            value: f64::NAN,
            computed: false,
        }
    }

    /// Coverage counters accumulated during `compute()`
    pub fn coverage(&self) -> Coverage {
        self.coverage
    }
}

impl EvaluationMetric for Rmse {
    fn name(&self) -> String {
        "RMSE".to_string()
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let (differences, coverage) =
            per_user_differences(&self.predictions, &self.test, self.strategy);
        self.coverage = coverage;

        let mut total = 0.0;
        let mut count = 0usize;
        for (user, diffs) in differences {
            if diffs.is_empty() {
                self.per_user.insert(user, f64::NAN);
                continue;
            }
            let sum: f64 = diffs.iter().map(|d| d * d).sum();
            self.per_user.insert(user, (sum / diffs.len() as f64).sqrt());
            total += sum;
            count += diffs.len();
        }
        self.value = if count == 0 {
            f64::NAN
        } else {
            (total / count as f64).sqrt()
        };
        self.computed = true;
        debug!(
            "RMSE = {} over {} considered pairs ({:?})",
            self.value, count, self.coverage
        );
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn per_user(&self) -> &BTreeMap<UserId, f64> {
        &self.per_user
    }
}
