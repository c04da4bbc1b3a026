//! Expected popularity complement.

use crate::ranking::{CutoffTables, RankedLists};
use crate::EvaluationMetric;
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mean over the top-k list of (1 - popularity), where popularity is
/// the fraction of training users that rated the item.
pub struct Epc {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    training: Arc<IndexedPreferenceStore>,
    num_training_users: usize,
    tables: CutoffTables,
    computed: bool,
}

impl Epc {
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

    fn popularity(&self, item: pref_store::ItemId) -> f64 {
        if self.num_training_users == 0 {
            return 0.0;
        }
        self.training.popularity(item).unwrap_or(0) as f64 / self.num_training_users as f64
    }
}

impl EvaluationMetric for Epc {
    fn name(&self) -> String {
        format!("EPC@{}", self.tables.max_cutoff())
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
                let top: Vec<_> = list.iter().take(k).collect();
                let value = if top.is_empty() {
                    f64::NAN
                } else {
                    top.iter().map(|&&item| 1.0 - self.popularity(item)).sum::<f64>()
                        / top.len() as f64
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
    fn test_popular_items_score_low() {
        // Two training users; item 1 rated by both (pop 1.0), item 2 by
        // one (pop 0.5)
        let mut training = PreferenceStore::new();
        training.add_preference(1, 1, 4.0);
        training.add_preference(2, 1, 4.0);
        training.add_preference(2, 2, 4.0);
        let training = Arc::new(IndexedPreferenceStore::from_store(&training));

        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 0.9);
        predictions.add_preference(1, 2, 0.8);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 9, 5.0);

        let mut epc = Epc::new(Arc::new(predictions), Arc::new(test), training, vec![2])
            .unwrap();
        epc.compute();
        // (1-1.0 + 1-0.5) / 2
        assert!((epc.value() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_unfrozen_training_store_is_rejected() {
        let training = Arc::new(IndexedPreferenceStore::new());
        let result = Epc::new(
            Arc::new(PreferenceStore::new()),
            Arc::new(PreferenceStore::new()),
            training,
            vec![5],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_list_is_nan() {
        let training =
            Arc::new(IndexedPreferenceStore::from_store(&PreferenceStore::new()));
        let mut test = PreferenceStore::new();
        test.add_preference(1, 9, 5.0);

        let mut epc = Epc::new(
            Arc::new(PreferenceStore::new()),
            Arc::new(test),
            training,
            vec![5],
        )
        .unwrap();
        epc.compute();
        assert!(epc.user_value(1).unwrap().is_nan());
        assert!(epc.value().is_nan());
    }
}
