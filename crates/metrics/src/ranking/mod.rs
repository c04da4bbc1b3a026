//! Ranking metrics computed per user at each requested cutoff.
//!
//! Shared machinery:
//! - `RankedLists`: each test user's predicted items sorted
//!   score-descending (item-id ascending on ties, NaN scores dropped)
//! - `CutoffTables`: per-(user, cutoff) values plus the per-cutoff
//!   global mean over users with a defined value
//!
//! The global value of a ranked metric is its value at the largest
//! configured cutoff; every other cutoff stays retrievable through
//! `value_at` / `user_value_at`.

pub mod map;
pub mod mrr;
pub mod ndcg;
pub mod precision;
pub mod recall;

pub use map::Map;
pub use mrr::Mrr;
pub use ndcg::Ndcg;
pub use precision::Precision;
pub use recall::Recall;

use crate::mean_ignoring_nan;
use pref_store::{ItemId, PreferenceStore, UserId};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Per-user ranked recommendation lists for every test user.
pub(crate) struct RankedLists {
    lists: BTreeMap<UserId, Vec<ItemId>>,
}

impl RankedLists {
    /// Rank each test user's predictions.
    ///
    /// Users without predictions get an empty list.
    pub fn build(predictions: &PreferenceStore, test: &PreferenceStore) -> Self {
        let lists: BTreeMap<UserId, Vec<ItemId>> = test
            .user_item_preferences()
            .par_iter()
            .map(|(&user, _)| {
                let mut scored: Vec<(ItemId, f64)> = predictions
                    .user_item_preferences()
                    .get(&user)
                    .map(|m| {
                        m.iter()
                            .filter(|(_, s)| !s.is_nan())
                            .map(|(&item, &score)| (item, score))
                            .collect()
                    })
                    .unwrap_or_default();
                scored.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.0.cmp(&b.0))
                });
                (user, scored.into_iter().map(|(item, _)| item).collect())
            })
            .collect();
        Self { lists }
    }

    pub fn list(&self, user: UserId) -> &[ItemId] {
        self.lists
            .get(&user)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// The user's test items rated at or above `threshold`.
pub(crate) fn relevant_items(
    test: &PreferenceStore,
    user: UserId,
    threshold: f64,
) -> BTreeSet<ItemId> {
    test.user_item_preferences()
        .get(&user)
        .map(|items| {
            items
                .iter()
                .filter(|&(_, &score)| score >= threshold)
                .map(|(&item, _)| item)
                .collect()
        })
        .unwrap_or_default()
}

/// Per-(user, cutoff) value tables with per-cutoff global means.
pub(crate) struct CutoffTables {
    cutoffs: Vec<usize>,
    per_user: BTreeMap<usize, BTreeMap<UserId, f64>>,
    global: BTreeMap<usize, f64>,
}

impl CutoffTables {
    /// An empty cutoff list defaults to the conventional top-10.
    pub fn new(mut cutoffs: Vec<usize>) -> Self {
        if cutoffs.is_empty() {
            cutoffs.push(10);
        }
        cutoffs.sort_unstable();
        cutoffs.dedup();
        let per_user = cutoffs.iter().map(|&k| (k, BTreeMap::new())).collect();
        Self {
            cutoffs,
            per_user,
            global: BTreeMap::new(),
        }
    }

    pub fn cutoffs(&self) -> &[usize] {
        &self.cutoffs
    }

    pub fn max_cutoff(&self) -> usize {
        *self.cutoffs.last().unwrap_or(&10)
    }

    pub fn insert(&mut self, k: usize, user: UserId, value: f64) {
        if let Some(table) = self.per_user.get_mut(&k) {
            table.insert(user, value);
        }
    }

    /// Compute the per-cutoff global means (NaN users excluded).
    pub fn aggregate(&mut self) {
        self.global = self
            .per_user
            .iter()
            .map(|(&k, table)| (k, mean_ignoring_nan(table)))
            .collect();
    }

    pub fn value_at(&self, k: usize) -> f64 {
        self.global.get(&k).copied().unwrap_or(f64::NAN)
    }

    pub fn user_value_at(&self, user: UserId, k: usize) -> Option<f64> {
        self.per_user.get(&k).and_then(|t| t.get(&user)).copied()
    }

    pub fn per_user_at_max(&self) -> &BTreeMap<UserId, f64> {
        // max cutoff table always exists by construction
        &self.per_user[&self.max_cutoff()]
    }
}
