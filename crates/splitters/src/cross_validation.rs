//! K-fold cross-validation splitter.
//!
//! ## Algorithm
//! 1. Shuffle the pair list (each user's items independently, or the
//!    global pair list) with an RNG derived from the seed
//! 2. Deal pairs into `n_folds` round-robin buckets
//! 3. Bucket *i* becomes fold *i*'s test set; the other buckets form
//!    fold *i*'s training set
//!
//! Invariant: a given (user, item) pair is test in exactly one fold and
//! training in the other `n_folds - 1`.

use crate::{SplitPair, Splitter};
use pref_store::{ItemId, PreferenceStore, UserId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// Deterministic seeded k-fold splitter producing `n_folds` pairs.
pub struct CrossValidationSplitter {
    n_folds: usize,
    per_user: bool,
    seed: u64,
}

impl CrossValidationSplitter {
    pub fn new(n_folds: usize, per_user: bool, seed: u64) -> Self {
        Self {
            n_folds,
            per_user,
            seed,
        }
    }

    /// Assign a round-robin bucket index to every (user, item) pair.
    fn bucket_assignments(
        &self,
        data: &PreferenceStore,
        rng: &mut StdRng,
    ) -> Vec<(UserId, ItemId, usize)> {
        let mut assignments = Vec::with_capacity(data.num_preferences());
        if self.per_user {
            for (&user, items) in data.user_item_preferences() {
                let mut item_ids: Vec<ItemId> = items.keys().copied().collect();
                item_ids.shuffle(rng);
                for (idx, &item) in item_ids.iter().enumerate() {
                    assignments.push((user, item, idx % self.n_folds));
                }
            }
        } else {
            let mut pairs: Vec<(UserId, ItemId)> = data
                .iter_preferences()
                .map(|p| (p.user_id, p.item_id))
                .collect();
            pairs.shuffle(rng);
            for (idx, &(user, item)) in pairs.iter().enumerate() {
                assignments.push((user, item, idx % self.n_folds));
            }
        }
        assignments
    }
}

impl Splitter for CrossValidationSplitter {
    fn name(&self) -> &str {
        "CrossValidationSplitter"
    }

    fn split(&self, data: &PreferenceStore) -> Vec<SplitPair> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let assignments = self.bucket_assignments(data, &mut rng);

        let mut folds: Vec<SplitPair> = (0..self.n_folds).map(|_| SplitPair::default()).collect();
        for &(user, item, bucket) in &assignments {
            for (fold, pair) in folds.iter_mut().enumerate() {
                let side = if fold == bucket { &mut pair.test } else { &mut pair.training };
                data.copy_pair_into(side, user, item);
            }
        }

        debug!(
            "Cross-validation split into {} folds over {} preferences",
            self.n_folds,
            data.num_preferences()
        );
        folds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> PreferenceStore {
        let mut store = PreferenceStore::new();
        for user in 1..=3 {
            for item in 1..=10 {
                store.add_preference(user, item, item as f64 % 5.0);
                store.add_timestamp(user, item, (user * 1000 + item) as i64);
            }
        }
        store
    }

    #[test]
    fn test_fold_count_and_complementarity() {
        let data = create_test_store();
        let folds = CrossValidationSplitter::new(5, true, 42).split(&data);
        assert_eq!(folds.len(), 5);

        for pair in &folds {
            assert_eq!(
                pair.training.num_preferences() + pair.test.num_preferences(),
                data.num_preferences()
            );
        }
    }

    #[test]
    fn test_each_pair_is_test_exactly_once() {
        let data = create_test_store();
        let folds = CrossValidationSplitter::new(5, true, 42).split(&data);

        for pref in data.iter_preferences() {
            let test_count = folds
                .iter()
                .filter(|f| f.test.preference(pref.user_id, pref.item_id).is_some())
                .count();
            let train_count = folds
                .iter()
                .filter(|f| f.training.preference(pref.user_id, pref.item_id).is_some())
                .count();
            assert_eq!(test_count, 1);
            assert_eq!(train_count, 4);
        }
    }

    #[test]
    fn test_per_user_folds_are_balanced() {
        let data = create_test_store();
        let folds = CrossValidationSplitter::new(5, true, 42).split(&data);

        // 10 items per user dealt round-robin into 5 buckets: 2 each
        for pair in &folds {
            for user in 1..=3 {
                assert_eq!(pair.test.items_rated_by(user).count(), 2);
                assert_eq!(pair.training.items_rated_by(user).count(), 8);
            }
        }
    }

    #[test]
    fn test_global_folds_cover_everything() {
        let data = create_test_store();
        let folds = CrossValidationSplitter::new(3, false, 7).split(&data);

        let total_test: usize = folds.iter().map(|f| f.test.num_preferences()).sum();
        assert_eq!(total_test, data.num_preferences());
    }

    #[test]
    fn test_deterministic_given_seed() {
        let data = create_test_store();
        let splitter = CrossValidationSplitter::new(4, false, 42);
        let a = splitter.split(&data);
        let b = splitter.split(&data);
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.training, fb.training);
            assert_eq!(fa.test, fb.test);
        }
    }

    #[test]
    fn test_timestamps_travel() {
        let data = create_test_store();
        let folds = CrossValidationSplitter::new(2, true, 1).split(&data);

        for pref in folds[0].test.iter_preferences() {
            assert_eq!(
                folds[0].test.timestamps(pref.user_id, pref.item_id),
                data.timestamps(pref.user_id, pref.item_id)
            );
        }
    }
}
