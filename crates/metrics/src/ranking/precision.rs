//! Precision at cutoff.

use crate::ranking::{relevant_items, CutoffTables, RankedLists};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fraction of the top-k list that is relevant in the test store.
pub struct Precision {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    threshold: f64,
    tables: CutoffTables,
    computed: bool,
}

impl Precision {
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        threshold: f64,
        cutoffs: Vec<usize>,
    ) -> Self {
        Self {
            predictions,
            test,
            threshold,
            tables: CutoffTables::new(cutoffs),
            computed: false,
        }
    }
}

impl EvaluationMetric for Precision {
    fn name(&self) -> String {
        format!("Precision@{}", self.tables.max_cutoff())
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let lists = RankedLists::build(&self.predictions, &self.test);
        let users: Vec<UserId> = self.test.users().collect();
        let cutoffs = self.tables.cutoffs().to_vec();
        for user in users {
            let relevant = relevant_items(&self.test, user, self.threshold);
            let list = lists.list(user);
            for &k in &cutoffs {
                let hits = list.iter().take(k).filter(|i| relevant.contains(i)).count();
                self.tables.insert(k, user, hits as f64 / k as f64);
            }
        }
        self.tables.aggregate();
        self.computed = true;
    }

    fn value(&self) -> f64 {
        self.tables.value_at(self.tables.max_cutoff())
    }

    fn per_user(&self) -> &BTreeMap<UserId, f64> {
        self.tables.per_user_at_max()
    }

    fn cutoffs(&self) -> &[usize] {
        self.tables.cutoffs()
    }

    fn value_at(&self, k: usize) -> f64 {
        self.tables.value_at(k)
    }

    fn user_value_at(&self, user: UserId, k: usize) -> Option<f64> {
        self.tables.user_value_at(user, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_at_two() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 10, 0.9);
        predictions.add_preference(1, 20, 0.8);
        predictions.add_preference(1, 30, 0.7);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 10, 5.0);
        test.add_preference(1, 30, 5.0);
        test.add_preference(1, 20, 1.0);

        let mut precision =
            Precision::new(Arc::new(predictions), Arc::new(test), 4.0, vec![2, 3]);
        precision.compute();

        // Top-2 = [10, 20], one relevant
        assert_eq!(precision.value_at(2), 0.5);
        // Top-3 = [10, 20, 30], two relevant
        assert!((precision.value_at(3) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(precision.user_value_at(1, 2), Some(0.5));
    }

    #[test]
    fn test_user_without_predictions_scores_zero() {
        let predictions = PreferenceStore::new();
        let mut test = PreferenceStore::new();
        test.add_preference(1, 10, 5.0);

        let mut precision =
            Precision::new(Arc::new(predictions), Arc::new(test), 4.0, vec![5]);
        precision.compute();
        assert_eq!(precision.user_value(1), Some(0.0));
        assert_eq!(precision.value(), 0.0);
    }
}
