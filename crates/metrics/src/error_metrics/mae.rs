//! Mean absolute error.

use crate::error_metrics::{per_user_differences, Coverage, ErrorStrategy};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Mean absolute error between predictions and test preferences.
///
/// The global value is total absolute error over total considered
/// items (count-weighted), not a mean of per-user means. A user with
/// zero considered items gets a NaN per-user value and contributes
/// nothing to the totals.
pub struct Mae {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    strategy: ErrorStrategy,
    per_user: BTreeMap<UserId, f64>,
    coverage: Coverage,
    value: f64,
    computed: bool,
}

impl Mae {
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

impl EvaluationMetric for Mae {
    fn name(&self) -> String {
        "MAE".to_string()
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
            let sum: f64 = diffs.iter().map(|d| d.abs()).sum();
            self.per_user.insert(user, sum / diffs.len() as f64);
            total += sum;
            count += diffs.len();
        }
        self.value = if count == 0 { f64::NAN } else { total / count as f64 };
        self.computed = true;
        debug!(
            "MAE = {} over {} considered pairs ({:?})",
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair_reference_value() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 1.0);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 3.0);

        let mut mae = Mae::new(
            Arc::new(predictions),
            Arc::new(test),
            ErrorStrategy::default(),
        );
        mae.compute();
        assert_eq!(mae.value(), 2.0);
        assert_eq!(mae.user_value(1), Some(2.0));
    }

    #[test]
    fn test_empty_intersection_is_nan() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 9, 1.0);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 3.0);

        let mut mae = Mae::new(
            Arc::new(predictions),
            Arc::new(test),
            ErrorStrategy::default(),
        );
        mae.compute();
        assert!(mae.value().is_nan());
        assert!(mae.user_value(1).unwrap().is_nan());
    }

    #[test]
    fn test_error_strategy_reference_table() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 2.0);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 4.0);
        test.add_preference(1, 2, 1.0);
        let predictions = Arc::new(predictions);
        let test = Arc::new(test);

        let mut drop_missing = Mae::new(
            predictions.clone(),
            test.clone(),
            ErrorStrategy::NotConsiderNan,
        );
        drop_missing.compute();
        assert_eq!(drop_missing.value(), 2.0);
        assert_eq!(drop_missing.coverage().empty_items, 1);

        let mut as_zero = Mae::new(predictions, test, ErrorStrategy::ConsiderNanAs(0.0));
        as_zero.compute();
        assert_eq!(as_zero.value(), 1.5);
    }

    #[test]
    fn test_global_is_count_weighted() {
        // User 1: two considered pairs with errors 1.0, 1.0
        // User 2: one considered pair with error 4.0
        // Count-weighted global: (1+1+4)/3 = 2.0; mean of means is 2.5
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 1.0);
        predictions.add_preference(1, 2, 1.0);
        predictions.add_preference(2, 1, 1.0);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 2.0);
        test.add_preference(1, 2, 2.0);
        test.add_preference(2, 1, 5.0);

        let mut mae = Mae::new(
            Arc::new(predictions),
            Arc::new(test),
            ErrorStrategy::default(),
        );
        mae.compute();
        assert_eq!(mae.value(), 2.0);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 1.0);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 3.0);

        let mut mae = Mae::new(
            Arc::new(predictions),
            Arc::new(test),
            ErrorStrategy::default(),
        );
        mae.compute();
        let first = mae.value();
        mae.compute();
        assert_eq!(mae.value(), first);
    }
}
