//! Expected profile distance.

use crate::diversity::ItemDistance;
use crate::ranking::{CutoffTables, RankedLists};
use crate::EvaluationMetric;
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, ItemId, PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mean distance between the top-k items and the user's relevant
/// training profile (training items rated at or above the threshold).
///
/// Unknown distances are skipped; users with an empty profile or no
/// known pair yield NaN.
pub struct Epd {
    predictions: Arc<PreferenceStore>,
    test: Arc<PreferenceStore>,
    training: Arc<IndexedPreferenceStore>,
    distance: Arc<dyn ItemDistance>,
    threshold: f64,
    tables: CutoffTables,
    computed: bool,
}

impl Epd {
    /// Fails if the training store has not been frozen.
    pub fn new(
        predictions: Arc<PreferenceStore>,
        test: Arc<PreferenceStore>,
        training: Arc<IndexedPreferenceStore>,
        distance: Arc<dyn ItemDistance>,
        threshold: f64,
        cutoffs: Vec<usize>,
    ) -> Result<Self> {
        training.num_users()?;
        Ok(Self {
            predictions,
            test,
            training,
            distance,
            threshold,
            tables: CutoffTables::new(cutoffs),
            computed: false,
        })
    }

    /// Training items the user rated at or above the threshold.
    fn profile(&self, user: UserId) -> Vec<ItemId> {
        let rated = match self.training.rated_by(user) {
            Ok(Some(rated)) => rated.clone(),
            _ => return Vec::new(),
        };
        rated
            .into_iter()
            .filter(|&item| {
                matches!(self.training.preference(user, item), Ok(Some(s)) if s >= self.threshold)
            })
            .collect()
    }
}

impl EvaluationMetric for Epd {
    fn name(&self) -> String {
        format!("EPD@{}", self.tables.max_cutoff())
    }

    fn compute(&mut self) {
        if self.computed {
            return;
        }
        let lists = RankedLists::build(&self.predictions, &self.test);
        let users: Vec<UserId> = self.test.users().collect();
        let cutoffs = self.tables.cutoffs().to_vec();
        for user in users {
            let profile = self.profile(user);
            let list = lists.list(user);
            for &k in &cutoffs {
                let mut sum = 0.0;
                let mut count = 0usize;
                for &recommended in list.iter().take(k) {
                    for &profiled in &profile {
                        if let Some(d) = self.distance.distance(recommended, profiled) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diversity::StoredItemDistance;

    #[test]
    fn test_distance_to_profile() {
        let mut training = PreferenceStore::new();
        training.add_preference(1, 1, 5.0); // in profile
        training.add_preference(1, 2, 1.0); // below threshold
        let training = Arc::new(IndexedPreferenceStore::from_store(&training));

        let mut stored = StoredItemDistance::new();
        stored.insert(3, 1, 0.4);
        stored.insert(4, 1, 0.8);
        stored.insert(3, 2, 0.0); // would change the mean if profile leaked

        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 3, 0.9);
        predictions.add_preference(1, 4, 0.8);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 9, 5.0);

        let mut epd = Epd::new(
            Arc::new(predictions),
            Arc::new(test),
            training,
            Arc::new(stored),
            4.0,
            vec![2],
        )
        .unwrap();
        epd.compute();
        assert!((epd.value() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_profile_is_nan() {
        let training =
            Arc::new(IndexedPreferenceStore::from_store(&PreferenceStore::new()));
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 3, 0.9);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 9, 5.0);

        let mut epd = Epd::new(
            Arc::new(predictions),
            Arc::new(test),
            training,
            Arc::new(StoredItemDistance::new()),
            4.0,
            vec![2],
        )
        .unwrap();
        epd.compute();
        assert!(epd.value().is_nan());
    }
}
