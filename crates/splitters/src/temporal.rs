//! Temporal splitter: train on the past, test on the future.
//!
//! ## Algorithm
//! 1. Collect the distinct timestamps (globally, or per user)
//! 2. Sort ascending and cut at `round(train_fraction * count)`;
//!    timestamps beyond the cut form the test window
//! 3. Assign pairs or individual observations against the window:
//!    - pair granularity (`per_item`): a (user, item) pair goes wholly
//!      to test iff any of its timestamps falls in the window
//!    - observation granularity: each (user, item, timestamp)
//!      observation is assigned independently, so a pair's preference
//!      value may land on both sides for different timestamps
//!
//! Pairs carrying no timestamp at all go to training: they cannot fall
//! inside a test window. No RNG is involved; the split is a pure
//! function of the data.

use crate::{cut_point, SplitPair, Splitter};
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeSet;
use tracing::debug;

/// Deterministic timestamp-window splitter producing one pair.
pub struct TemporalSplitter {
    train_fraction: f64,
    per_user: bool,
    per_item: bool,
}

impl TemporalSplitter {
    /// Create a splitter cutting the global timeline at `train_fraction`.
    pub fn new(train_fraction: f64) -> Self {
        Self {
            train_fraction,
            per_user: false,
            per_item: false,
        }
    }

    /// Cut each user's own timeline instead of the global one
    pub fn with_per_user(mut self, per_user: bool) -> Self {
        self.per_user = per_user;
        self
    }

    /// Assign whole (user, item) pairs instead of individual observations
    pub fn with_per_item(mut self, per_item: bool) -> Self {
        self.per_item = per_item;
        self
    }

    /// The earliest timestamp of the test window, or `None` when the
    /// cut leaves no timestamps beyond it (everything is training).
    fn window_start_at(&self, timestamps: &BTreeSet<i64>) -> Option<i64> {
        let sorted: Vec<i64> = timestamps.iter().copied().collect();
        let cut = cut_point(self.train_fraction, sorted.len());
        sorted.get(cut).copied()
    }

    /// Assign one user's pairs given the start of the test window
    /// (`None` means everything is training).
    fn assign_user(
        &self,
        data: &PreferenceStore,
        user: UserId,
        window_start: Option<i64>,
        pair: &mut SplitPair,
    ) {
        let in_window = |t: i64| window_start.is_some_and(|w| t >= w);
        let items: Vec<_> = data.items_rated_by(user).collect();
        for item in items {
            let timestamps = data.timestamps(user, item);
            if self.per_item {
                let any_in_window = timestamps.iter().any(|&t| in_window(t));
                let side = if any_in_window { &mut pair.test } else { &mut pair.training };
                data.copy_pair_into(side, user, item);
            } else if timestamps.is_empty() {
                data.copy_pair_into(&mut pair.training, user, item);
            } else {
                // Observation granularity: the preference value follows
                // each timestamp independently
                let score = data.preference(user, item).unwrap_or(f64::NAN);
                for &t in timestamps {
                    let side = if in_window(t) { &mut pair.test } else { &mut pair.training };
                    side.add_preference(user, item, score);
                    side.add_timestamp(user, item, t);
                }
            }
        }
    }
}

impl Splitter for TemporalSplitter {
    fn name(&self) -> &str {
        "TemporalSplitter"
    }

    fn split(&self, data: &PreferenceStore) -> Vec<SplitPair> {
        let mut pair = SplitPair::default();

        if self.per_user {
            for (&user, items) in data.user_item_timestamps() {
                let distinct: BTreeSet<i64> =
                    items.values().flat_map(|v| v.iter().copied()).collect();
                let window_start = self.window_start_at(&distinct);
                self.assign_user(data, user, window_start, &mut pair);
            }
            // Users with preferences but no timestamps at all
            for user in data.users().collect::<Vec<_>>() {
                if !data.user_item_timestamps().contains_key(&user) {
                    self.assign_user(data, user, None, &mut pair);
                }
            }
        } else {
            let distinct: BTreeSet<i64> = data
                .user_item_timestamps()
                .values()
                .flat_map(|items| items.values())
                .flat_map(|v| v.iter().copied())
                .collect();
            let window_start = self.window_start_at(&distinct);
            for user in data.users().collect::<Vec<_>>() {
                self.assign_user(data, user, window_start, &mut pair);
            }
        }

        debug!(
            "Temporal split: {} training / {} test preferences",
            pair.training.num_preferences(),
            pair.test.num_preferences()
        );
        vec![pair]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> PreferenceStore {
        let mut store = PreferenceStore::new();
        // User 1: four items at times 10, 20, 30, 40
        for (item, t) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
            store.add_preference(1, item, item as f64);
            store.add_timestamp(1, item, t);
        }
        // User 2: two items at times 15, 35
        for (item, t) in [(5, 15), (6, 35)] {
            store.add_preference(2, item, item as f64);
            store.add_timestamp(2, item, t);
        }
        store
    }

    #[test]
    fn test_global_window_split() {
        let data = create_test_store();
        // Distinct times: 10,15,20,30,35,40 -> cut at round(0.5*6)=3,
        // window starts at 30
        let pairs = TemporalSplitter::new(0.5).split(&data);
        let pair = &pairs[0];

        assert!(pair.training.preference(1, 1).is_some());
        assert!(pair.training.preference(2, 5).is_some());
        assert!(pair.training.preference(1, 2).is_some());
        assert!(pair.test.preference(1, 3).is_some());
        assert!(pair.test.preference(2, 6).is_some());
        assert!(pair.test.preference(1, 4).is_some());
        assert_eq!(
            pair.training.num_preferences() + pair.test.num_preferences(),
            data.num_preferences()
        );
    }

    #[test]
    fn test_training_precedes_test() {
        let data = create_test_store();
        let pairs = TemporalSplitter::new(0.5).split(&data);
        let pair = &pairs[0];

        let max_train = pair
            .training
            .user_item_timestamps()
            .values()
            .flat_map(|m| m.values())
            .flat_map(|v| v.iter())
            .max();
        let min_test = pair
            .test
            .user_item_timestamps()
            .values()
            .flat_map(|m| m.values())
            .flat_map(|v| v.iter())
            .min();
        assert!(max_train < min_test);
    }

    #[test]
    fn test_per_user_windows_are_independent() {
        let data = create_test_store();
        // User 1 times: 10,20,30,40 -> cut 2, window from 30
        // User 2 times: 15,35 -> cut 1, window from 35
        let pairs = TemporalSplitter::new(0.5).with_per_user(true).split(&data);
        let pair = &pairs[0];

        assert!(pair.test.preference(1, 3).is_some());
        assert!(pair.test.preference(1, 4).is_some());
        assert!(pair.training.preference(2, 5).is_some());
        assert!(pair.test.preference(2, 6).is_some());
    }

    #[test]
    fn test_observation_granularity_may_duplicate_pairs() {
        let mut data = PreferenceStore::new();
        data.add_preference(1, 1, 4.0);
        data.add_timestamp(1, 1, 10);
        data.add_timestamp(1, 1, 40);
        data.add_preference(1, 2, 3.0);
        data.add_timestamp(1, 2, 20);

        // Distinct: 10,20,40 -> cut at round(0.5*3)=2, window from 40
        let pairs = TemporalSplitter::new(0.5).split(&data);
        let pair = &pairs[0];

        // Pair (1,1) straddles the cut: on both sides, one timestamp each
        assert_eq!(pair.training.preference(1, 1), Some(4.0));
        assert_eq!(pair.test.preference(1, 1), Some(4.0));
        assert_eq!(pair.training.timestamps(1, 1), &[10]);
        assert_eq!(pair.test.timestamps(1, 1), &[40]);
    }

    #[test]
    fn test_pair_granularity_assigns_wholly() {
        let mut data = PreferenceStore::new();
        data.add_preference(1, 1, 4.0);
        data.add_timestamp(1, 1, 10);
        data.add_timestamp(1, 1, 40);
        data.add_preference(1, 2, 3.0);
        data.add_timestamp(1, 2, 20);

        let pairs = TemporalSplitter::new(0.5).with_per_item(true).split(&data);
        let pair = &pairs[0];

        // Any timestamp in the window sends the whole pair to test
        assert!(pair.training.preference(1, 1).is_none());
        assert_eq!(pair.test.preference(1, 1), Some(4.0));
        assert_eq!(pair.test.timestamps(1, 1), &[10, 40]);
        assert_eq!(pair.training.preference(1, 2), Some(3.0));
    }

    #[test]
    fn test_pairs_without_timestamps_go_to_training() {
        let mut data = PreferenceStore::new();
        data.add_preference(1, 1, 4.0);
        data.add_preference(1, 2, 3.0);
        data.add_timestamp(1, 2, 50);

        let pairs = TemporalSplitter::new(0.0).split(&data);
        let pair = &pairs[0];

        assert_eq!(pair.training.preference(1, 1), Some(4.0));
        assert_eq!(pair.test.preference(1, 2), Some(3.0));
    }

    #[test]
    fn test_no_rng_full_determinism() {
        let data = create_test_store();
        let splitter = TemporalSplitter::new(0.5).with_per_user(true);
        let a = splitter.split(&data);
        let b = splitter.split(&data);
        assert_eq!(a[0].training, b[0].training);
        assert_eq!(a[0].test, b[0].test);
    }
}
