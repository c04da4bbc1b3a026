//! Expected intra-list distance.

use crate::diversity::ItemDistance;
use crate::ranking::{CutoffTables, RankedLists};
use crate::EvaluationMetric;
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mean pairwise distance between the items of a user's top-k list.
///
/// Pairs with unknown distance are skipped; a list with fewer than two
/// items, or with no known pair, yields NaN.
pub struct Eild {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    distance: Arc<dyn ItemDistance>,
    tables: CutoffTables,
    computed: bool,
}

impl Eild {
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        distance: Arc<dyn ItemDistance>,
        cutoffs: Vec<usize>,
    ) -> Self {
        Self {
            predictions,
            test,
            distance,
            tables: CutoffTables::new(cutoffs),
            computed: false,
        }
    }
}

impl EvaluationMetric for Eild {
    fn name(&self) -> String {
        format!("EILD@{}", self.tables.max_cutoff())
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let lists = RankedLists::build(&self.predictions, &self.test);
        let users: Vec<UserId> = self.test.users().collect();
        let cutoffs = self.tables.cutoffs().to_vec();
        for user in users {
            let list = lists.list(user);
            for &k in &cutoffs {
                let top: Vec<_> = list.iter().take(k).copied().collect();
                let mut sum = 0.0;
                let mut count = 0usize;
                for (idx, &a) in top.iter().enumerate() {
                    for &b in &top[idx + 1..] {
                        if let Some(d) = self.distance.distance(a, b) {
                            sum += d;
                            count += 1;
                        }
                    }
                }
                let value = if count == 0 { f64::NAN } else { sum / count as f64 };
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
