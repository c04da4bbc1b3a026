//! Core trait for candidate-selection strategies.
//!
//! A strategy decides, per user, which items an external recommender
//! must score during evaluation. Strategies are constructed from the
//! frozen training and test stores plus a relevance threshold.
//!
//! The universe-difference strategies always subtract the user's
//! *training* ratings: items the system trained on are never offered
//! again, while the user's held-out test items stay rankable.

use anyhow::Result;
use pref_store::{IndexedPreferenceStore, ItemId, UserId};
use std::collections::BTreeSet;

/// Core trait for candidate-selection policies.
///
/// ## Design Note
/// - `Send + Sync` allows strategies to be shared across parallel fold
///   pipelines
/// - reads go through the frozen `IndexedPreferenceStore`, so a
///   strategy handed an unfrozen store fails loudly instead of
///   returning empty sets
pub trait CandidateStrategy: Send + Sync {
    /// Returns the name of this strategy (for logging/output tags)
    fn name(&self) -> &str;

    /// The set of items to score/rank for `user`.
    fn candidate_items(&self, user: UserId) -> Result<BTreeSet<ItemId>>;
}

/// Items of `universe`'s item set the user has not rated in `training`.
pub(crate) fn universe_minus_training(
    universe: &IndexedPreferenceStore,
    training: &IndexedPreferenceStore,
    user: UserId,
) -> Result<BTreeSet<ItemId>> {
    let items = universe.item_universe()?;
    Ok(match training.rated_by(user)? {
        Some(rated) => items.difference(rated).copied().collect(),
        None => items.clone(),
    })
}

/// The user's test items rated at or above `threshold`.
pub(crate) fn relevant_test_items(
    test: &IndexedPreferenceStore,
    user: UserId,
    threshold: f64,
) -> Result<BTreeSet<ItemId>> {
    let mut relevant = BTreeSet::new();
    if let Some(rated) = test.rated_by(user)? {
        for &item in rated {
            if test.preference(user, item)?.is_some_and(|s| s >= threshold) {
                relevant.insert(item);
            }
        }
    }
    Ok(relevant)
}
