//! Normalised discounted cumulative gain at cutoff.

use crate::ranking::{CutoffTables, RankedLists};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// nDCG with linear gains (the test preference) and log2 discount.
///
/// The ideal ordering is the user's test preferences sorted
/// descending; a user whose ideal DCG is zero has an undefined value.
pub struct Ndcg {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    tables: CutoffTables,
    computed: bool,
}

impl Ndcg {
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        cutoffs: Vec<usize>,
    ) -> Self {
        Self {
            predictions,
            test,
            tables: CutoffTables::new(cutoffs),
            computed: false,
        }
    }

    fn dcg(gains: impl Iterator<Item = f64>) -> f64 {
        gains
            .enumerate()
            .map(|(idx, gain)| gain / ((idx + 2) as f64).log2())
            .sum()
    }
}

impl EvaluationMetric for Ndcg {
    fn name(&self) -> String {
        format!("nDCG@{}", self.tables.max_cutoff())
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let lists = RankedLists::build(&self.predictions, &self.test);
        let users: Vec<UserId> = self.test.users().collect();
        let cutoffs = self.tables.cutoffs().to_vec();
        for user in users {
            let test_prefs = self
                .test
                .user_item_preferences()
                .get(&user)
                .cloned()
                .unwrap_or_default();
            let mut ideal: Vec<f64> = test_prefs.values().copied().collect();
            ideal.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

            let list = lists.list(user);
            for &k in &cutoffs {
                let dcg = Self::dcg(
                    list.iter()
                        .take(k)
                        .map(|item| test_prefs.get(item).copied().unwrap_or(0.0)),
                );
                let idcg = Self::dcg(ideal.iter().take(k).copied());
                let value = if idcg > 0.0 { dcg / idcg } else { f64::NAN };
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
