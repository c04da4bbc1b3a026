//! Random shuffle-and-cut splitter.
//!
//! ## Algorithm
//! 1. Collect the pair list at the configured granularity (each user's
//!    items, each item's users, or the global pair list)
//! 2. Shuffle it with an RNG derived from the seed
//! 3. Cut at `round(train_fraction * len)`: everything before the cut
//!    is training, the rest is test
//!
//! The global path uses one shuffle and a single global cut; the
//! alternative per-pair Bernoulli policy was rejected because the cut
//! makes the produced sizes exact and matches the per-user path.

use crate::{cut_point, SplitPair, Splitter};
use pref_store::{ItemId, PreferenceStore, UserId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

/// Deterministic seeded random splitter producing one (training, test) pair.
pub struct RandomSplitter {
    train_fraction: f64,
    per_user: bool,
    per_item: bool,
    seed: u64,
}

impl RandomSplitter {
    /// Create a splitter cutting at `train_fraction`, splitting globally.
    pub fn new(train_fraction: f64, seed: u64) -> Self {
        Self {
            train_fraction,
            per_user: false,
            per_item: false,
            seed,
        }
    }

    /// Shuffle and cut each user's item list independently
    pub fn with_per_user(mut self, per_user: bool) -> Self {
        self.per_user = per_user;
        self
    }

    /// Shuffle and cut each item's user list independently.
    ///
    /// Only applies when `per_user` is off; `per_user` wins when both
    /// are set.
    pub fn with_per_item(mut self, per_item: bool) -> Self {
        self.per_item = per_item;
        self
    }

    fn split_per_user(&self, data: &PreferenceStore, rng: &mut StdRng) -> SplitPair {
        let mut pair = SplitPair::default();
        for (&user, items) in data.user_item_preferences() {
            let mut item_ids: Vec<ItemId> = items.keys().copied().collect();
            item_ids.shuffle(rng);
            let cut = cut_point(self.train_fraction, item_ids.len());
            for (idx, &item) in item_ids.iter().enumerate() {
                let side = if idx < cut { &mut pair.training } else { &mut pair.test };
                data.copy_pair_into(side, user, item);
            }
        }
        pair
    }

    fn split_per_item(&self, data: &PreferenceStore, rng: &mut StdRng) -> SplitPair {
        // Invert to item -> users; BTreeMap keeps the shuffle base stable
        let mut item_users: BTreeMap<ItemId, Vec<UserId>> = BTreeMap::new();
        for pref in data.iter_preferences() {
            item_users.entry(pref.item_id).or_default().push(pref.user_id);
        }

        let mut pair = SplitPair::default();
        for (&item, users) in item_users.iter_mut() {
            users.shuffle(rng);
            let cut = cut_point(self.train_fraction, users.len());
            for (idx, &user) in users.iter().enumerate() {
                let side = if idx < cut { &mut pair.training } else { &mut pair.test };
                data.copy_pair_into(side, user, item);
            }
        }
        pair
    }

    fn split_global(&self, data: &PreferenceStore, rng: &mut StdRng) -> SplitPair {
        let mut pairs: Vec<(UserId, ItemId)> = data
            .iter_preferences()
            .map(|p| (p.user_id, p.item_id))
            .collect();
        pairs.shuffle(rng);
        let cut = cut_point(self.train_fraction, pairs.len());

        let mut pair = SplitPair::default();
        for (idx, &(user, item)) in pairs.iter().enumerate() {
            let side = if idx < cut { &mut pair.training } else { &mut pair.test };
            data.copy_pair_into(side, user, item);
        }
        pair
    }
}

impl Splitter for RandomSplitter {
    fn name(&self) -> &str {
        "RandomSplitter"
    }

    fn split(&self, data: &PreferenceStore) -> Vec<SplitPair> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let pair = if self.per_user {
            self.split_per_user(data, &mut rng)
        } else if self.per_item {
            self.split_per_item(data, &mut rng)
        } else {
            self.split_global(data, &mut rng)
        };
        debug!(
            "Random split: {} training / {} test preferences",
            pair.training.num_preferences(),
            pair.test.num_preferences()
        );
        vec![pair]
    }
}
