//! Mean reciprocal rank at cutoff.

use crate::ranking::{relevant_items, CutoffTables, RankedLists};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reciprocal rank of the first relevant item within the top-k list;
/// zero when no relevant item appears.
pub struct Mrr {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    threshold: f64,
    tables: CutoffTables,
    computed: bool,
}

impl Mrr {
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

impl EvaluationMetric for Mrr {
    fn name(&self) -> String {
        format!("MRR@{}", self.tables.max_cutoff())
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
                let value = list
                    .iter()
                    .take(k)
                    .position(|item| relevant.contains(item))
                    .map(|rank| 1.0 / (rank + 1) as f64)
                    .unwrap_or(0.0);
                self.tables.insert(k, user, value);
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
    fn test_first_relevant_at_rank_three() {
        let mut predictions = PreferenceStore::new();
        for (item, score) in [(10, 0.9), (20, 0.8), (30, 0.7), (40, 0.6)] {
            predictions.add_preference(1, item, score);
        }
        let mut test = PreferenceStore::new();
        test.add_preference(1, 30, 5.0);

        let mut mrr = Mrr::new(Arc::new(predictions), Arc::new(test), 4.0, vec![20]);
        mrr.compute();
        assert!((mrr.value() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_relevant_beyond_cutoff_scores_zero() {
        let mut predictions = PreferenceStore::new();
        for (item, score) in [(10, 0.9), (20, 0.8), (30, 0.7)] {
            predictions.add_preference(1, item, score);
        }
        let mut test = PreferenceStore::new();
        test.add_preference(1, 30, 5.0);

        let mut mrr = Mrr::new(Arc::new(predictions), Arc::new(test), 4.0, vec![2]);
        mrr.compute();
        assert_eq!(mrr.value(), 0.0);
    }
}
