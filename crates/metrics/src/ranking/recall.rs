//! Recall at cutoff.

use crate::ranking::{relevant_items, CutoffTables, RankedLists};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fraction of the user's relevant test items found in the top-k list.
///
/// A user with no relevant test items has an undefined recall: NaN per
/// user, excluded from the global mean.
pub struct Recall {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    threshold: f64,
    tables: CutoffTables,
    computed: bool,
}

impl Recall {
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

impl EvaluationMetric for Recall {
    fn name(&self) -> String {
        format!("Recall@{}", self.tables.max_cutoff())
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
                    let hits =
                        list.iter().take(k).filter(|i| relevant.contains(i)).count();
                    hits as f64 / relevant.len() as f64
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
