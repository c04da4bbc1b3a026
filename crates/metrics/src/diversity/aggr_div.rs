//! Aggregate diversity: catalog coverage of the recommended lists.

use crate::ranking::RankedLists;
use crate::EvaluationMetric;
use pref_store::{ItemId, PreferenceStore, UserId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Fraction of the item universe covered by the distinct items in all
/// users' top-k lists jointly.
///
/// The universe is the test-store items unioned with every recommended
/// item. A joint metric: only the global value is defined, the
/// per-user table stays empty.
pub struct AggrDiv {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    cutoffs: Vec<usize>,
    global: BTreeMap<usize, f64>,
    empty_per_user: BTreeMap<UserId, f64>,
    computed: bool,
}

impl AggrDiv {
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
}

impl EvaluationMetric for AggrDiv {
    fn name(&self) -> String {
        format!("AggrDiv@{}", self.max_cutoff())
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let lists = RankedLists::build(&self.predictions, &self.test);
        let users: Vec<UserId> = self.test.users().collect();
        for &k in &self.cutoffs.clone() {
            let mut recommended: BTreeSet<ItemId> = BTreeSet::new();
            for &user in &users {
                recommended.extend(lists.list(user).iter().take(k).copied());
            }
            let mut universe: BTreeSet<ItemId> = self.test.items().collect();
            universe.extend(recommended.iter().copied());

            let value = if universe.is_empty() {
                f64::NAN
            } else {
                recommended.len() as f64 / universe.len() as f64
            };
            self.global.insert(k, value);
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
