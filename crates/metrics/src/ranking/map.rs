//! Mean average precision at cutoff.

use crate::ranking::{relevant_items, CutoffTables, RankedLists};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Average precision per user, averaged over users with at least one
/// relevant test item.
pub struct Map {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    threshold: f64,
    tables: CutoffTables,
    computed: bool,
}

impl Map {
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

impl EvaluationMetric for Map {
    fn name(&self) -> String {
        format!("MAP@{}", self.tables.max_cutoff())
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
                let value = if relevant.is_empty() {
                    f64::NAN
                } else {
                    let mut hits = 0usize;
                    let mut precision_sum = 0.0;
                    for (idx, item) in list.iter().take(k).enumerate() {
                        if relevant.contains(item) {
                            hits += 1;
                            precision_sum += hits as f64 / (idx + 1) as f64;
                        }
                    }
                    precision_sum / relevant.len().min(k) as f64
                };
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
    fn test_map_rewards_early_hits() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 10, 0.9);
        predictions.add_preference(1, 20, 0.8);
        predictions.add_preference(1, 30, 0.7);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 10, 5.0);
        test.add_preference(1, 30, 5.0);

        let mut map = Map::new(Arc::new(predictions), Arc::new(test), 4.0, vec![3]);
        map.compute();

        // Hits at ranks 1 and 3: AP = (1/1 + 2/3) / 2
        assert!((map.value() - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_relevant_is_nan() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 10, 0.9);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 10, 1.0);

        let mut map = Map::new(Arc::new(predictions), Arc::new(test), 4.0, vec![3]);
        map.compute();
        assert!(map.value().is_nan());
    }
}
