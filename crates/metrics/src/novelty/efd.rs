//! Expected free discovery.

use crate::ranking::{CutoffTables, RankedLists};
use crate::EvaluationMetric;
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mean over the top-k list of -log2(popularity).
///
/// Items never seen in training have no defined self-information and
/// are skipped; a list with no countable item yields NaN.
pub struct Efd {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    training: Arc<IndexedPreferenceStore>,
    num_training_users: usize,
    tables: CutoffTables,
    computed: bool,
}

impl Efd {
    /// Fails if the training store has not been frozen.
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        training: Arc<IndexedPreferenceStore>,
        cutoffs: Vec<usize>,
    ) -> Result<Self> {
        let num_training_users = training.num_users()?;
        Ok(Self {
            predictions,
            test,
            training,
            num_training_users,
            tables: CutoffTables::new(cutoffs),
            computed: false,
        })
    }
}

impl EvaluationMetric for Efd {
    fn name(&self) -> String {
        format!("EFD@{}", self.tables.max_cutoff())
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
                let mut sum = 0.0;
                let mut count = 0usize;
                for &item in list.iter().take(k) {
                    let raters = self.training.popularity(item).unwrap_or(0);
                    if raters > 0 && self.num_training_users > 0 {
                        let p = raters as f64 / self.num_training_users as f64;
                        sum += -p.log2();
                        count += 1;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rare_items_carry_more_information() {
        // Four training users; item 1 rated by all (pop 1, -log2 = 0),
        // item 2 rated by one (pop 0.25, -log2 = 2)
        let mut training = PreferenceStore::new();
        for user in 1..=4 {
            training.add_preference(user, 1, 4.0);
        }
        training.add_preference(1, 2, 4.0);
        let training = Arc::new(IndexedPreferenceStore::from_store(&training));

        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 0.9);
        predictions.add_preference(1, 2, 0.8);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 9, 5.0);

        let mut efd = Efd::new(Arc::new(predictions), Arc::new(test), training, vec![2])
            .unwrap();
        efd.compute();
        assert!((efd.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_items_are_skipped() {
        let mut training = PreferenceStore::new();
        training.add_preference(1, 1, 4.0);
        training.add_preference(2, 9, 4.0);
        let training = Arc::new(IndexedPreferenceStore::from_store(&training));

        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 0.9); // pop 0.5
        predictions.add_preference(1, 77, 0.8); // unseen, skipped
        let mut test = PreferenceStore::new();
        test.add_preference(1, 9, 5.0);

        let mut efd = Efd::new(Arc::new(predictions), Arc::new(test), training, vec![2])
            .unwrap();
        efd.compute();
        assert!((efd.value() - 1.0).abs() < 1e-12); // -log2(0.5)
    }
}
