//! One-vs-random candidate strategy.
//!
//! ## Algorithm
//! 1. Build the AllItems-style pool for the user
//! 2. Sample `n` items from the pool with a per-user seeded RNG
//! 3. Force-include every test item the user rated at or above the
//!    relevance threshold
//!
//! For output, one user expands into one synthetic ranking task per
//! relevant item *r*: pseudo-user `"{user}_{r}"` ranking {r} plus the
//! sampled-but-irrelevant items. Downstream ranking metrics over these
//! tasks implement the one-vs-random methodology.

use crate::traits::{relevant_test_items, universe_minus_training, CandidateStrategy};
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, ItemId, UserId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// One synthetic per-relevant-item ranking task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingTask {
    /// `"{user}_{relevant_item}"`
    pub pseudo_user: String,
    /// The relevant item this task is built around
    pub relevant_item: ItemId,
    /// The relevant item plus the sampled-but-irrelevant items
    pub items: BTreeSet<ItemId>,
}

/// Sample `n` random candidates, then force-include the relevant test items.
pub struct RelPlusN {
    training: Arc<IndexedPreferenceStore>,
    test: Arc<IndexedPreferenceStore>,
    threshold: f64,
    n: usize,
    seed: u64,
}

impl RelPlusN {
    pub fn new(
        training: Arc<IndexedPreferenceStore>,
        test: Arc<IndexedPreferenceStore>,
        threshold: f64,
        n: usize,
        seed: u64,
    ) -> Self {
        Self {
            training,
            test,
            threshold,
            n,
            seed,
        }
    }

    /// The seeded sample for `user`.
    ///
    /// Each user gets its own RNG stream (`seed + user`) so the result
    /// does not depend on the order users are queried in.
    fn sampled_items(&self, user: UserId) -> Result<BTreeSet<ItemId>> {
        let mut pool: Vec<ItemId> = universe_minus_training(&self.training, &self.training, user)?
            .union(&universe_minus_training(&self.test, &self.training, user)?)
            .copied()
            .collect();
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(user));
        pool.shuffle(&mut rng);
        pool.truncate(self.n);
        Ok(pool.into_iter().collect())
    }

    /// Expand `user` into one ranking task per relevant test item.
    pub fn ranking_tasks(&self, user: UserId) -> Result<Vec<RankingTask>> {
        let sampled = self.sampled_items(user)?;
        let relevant = relevant_test_items(&self.test, user, self.threshold)?;
        let irrelevant: BTreeSet<ItemId> = sampled.difference(&relevant).copied().collect();

        let tasks: Vec<RankingTask> = relevant
            .iter()
            .map(|&r| {
                let mut items = irrelevant.clone();
                items.insert(r);
                RankingTask {
                    pseudo_user: format!("{}_{}", user, r),
                    relevant_item: r,
                    items,
                }
            })
            .collect();
        debug!(
            "RelPlusN expanded user {} into {} ranking tasks",
            user,
            tasks.len()
        );
        Ok(tasks)
    }
}

impl CandidateStrategy for RelPlusN {
    fn name(&self) -> &str {
        "RelPlusN"
    }

    fn candidate_items(&self, user: UserId) -> Result<BTreeSet<ItemId>> {
        let mut candidates = self.sampled_items(user)?;
        candidates.extend(relevant_test_items(&self.test, user, self.threshold)?);
        Ok(candidates)
    }
}
