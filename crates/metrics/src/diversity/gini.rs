//! Gini-based exposure-spread index.

use crate::ranking::RankedLists;
use crate::EvaluationMetric;
use pref_store::{ItemId, PreferenceStore, UserId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Complement of the Gini coefficient of item-exposure counts across
/// all users' top-k lists.
///
/// Exposure counts are taken over the item universe (test items plus
/// every recommended item), sorted ascending, with the coefficient
/// normalised by (n - 1):
///
/// value = 1 - sum_i (2i - n - 1) * p(i) / (n - 1)
///
/// 1.0 means perfectly even exposure across the universe; values near
/// zero mean exposure concentrated on a few items. A joint metric:
/// only the global value is defined.
pub struct GiniIndex {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    cutoffs: Vec<usize>,
    global: BTreeMap<usize, f64>,
    empty_per_user: BTreeMap<UserId, f64>,
    computed: bool,
}

impl GiniIndex {
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        mut cutoffs: Vec<usize>,
    ) -> Self {
        if cutoffs.is_empty() {
            cutoffs.push(10);
        }
        cutoffs.sort_unstable();
        cutoffs.dedup();
        Self {
            predictions,
            test,
            cutoffs,
            global: BTreeMap::new(),
            empty_per_user: BTreeMap::new(),
            computed: false,
        }
    }

    fn max_cutoff(&self) -> usize {
        *self.cutoffs.last().unwrap_or(&10)
    }

    fn gini_complement(counts: &[usize], n: usize) -> f64 {
        let total: usize = counts.iter().sum();
        if n < 2 || total == 0 {
            return f64::NAN;
        }
        // counts must arrive sorted ascending; equal counts make the
        // order within a tie irrelevant
        let mut coefficient = 0.0;
        for (idx, &count) in counts.iter().enumerate() {
            let i = (idx + 1) as f64;
            coefficient += (2.0 * i - n as f64 - 1.0) * (count as f64 / total as f64);
        }
        1.0 - coefficient / (n as f64 - 1.0)
    }
}

impl EvaluationMetric for GiniIndex {
    fn name(&self) -> String {
        format!("GiniIndex@{}", self.max_cutoff())
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let lists = RankedLists::build(&self.predictions, &self.test);
        let users: Vec<UserId> = self.test.users().collect();
        for &k in &self.cutoffs.clone() {
            let mut exposure: BTreeMap<ItemId, usize> = BTreeMap::new();
            for &user in &users {
                for &item in lists.list(user).iter().take(k) {
                    *exposure.entry(item).or_insert(0) += 1;
                }
            }
            let mut universe: BTreeSet<ItemId> = self.test.items().collect();
            universe.extend(exposure.keys().copied());

            let mut counts: Vec<usize> = universe
                .iter()
                .map(|item| exposure.get(item).copied().unwrap_or(0))
                .collect();
            counts.sort_unstable();

            self.global
                .insert(k, Self::gini_complement(&counts, universe.len()));
        }
        self.computed = true;
    }

    fn value(&self) -> f64 {
        self.value_at(self.max_cutoff())
    }

    fn per_user(&self) -> &BTreeMap<UserId, f64> {
        &self.empty_per_user
    }

    fn cutoffs(&self) -> &[usize] {
        &self.cutoffs
    }

    fn value_at(&self, k: usize) -> f64 {
        self.global.get(&k).copied().unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test store with ten items spread over five users.
    fn ten_item_test_store() -> PreferenceStore {
        let mut test = PreferenceStore::new();
        for user in 1..=5u64 {
            test.add_preference(user, user * 2 - 1, 5.0);
            test.add_preference(user, user * 2, 5.0);
        }
        test
    }

    #[test]
    fn test_concentrated_exposure_reference_value() {
        // Same two items recommended to all five users
        let mut predictions = PreferenceStore::new();
        for user in 1..=5 {
            predictions.add_preference(user, 1, 0.9);
            predictions.add_preference(user, 2, 0.8);
        }

        let mut gini = GiniIndex::new(
            Arc::new(predictions),
            Arc::new(ten_item_test_store()),
            vec![2],
        );
        gini.compute();
        assert!((gini.value() - 0.1111).abs() < 1e-3);
    }

    #[test]
    fn test_even_exposure_reference_value() {
        // Each user gets their own two items: all ten items exposed once
        let mut predictions = PreferenceStore::new();
        for user in 1..=5u64 {
            predictions.add_preference(user, user * 2 - 1, 0.9);
            predictions.add_preference(user, user * 2, 0.8);
        }

        let mut gini = GiniIndex::new(
            Arc::new(predictions),
            Arc::new(ten_item_test_store()),
            vec![2],
        );
        gini.compute();
        assert!((gini.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_recommendations_is_nan() {
        let mut gini = GiniIndex::new(
            Arc::new(PreferenceStore::new()),
            Arc::new(ten_item_test_store()),
            vec![2],
        );
        gini.compute();
        assert!(gini.value().is_nan());
    }
}
