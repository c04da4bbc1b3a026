//! Core domain types for the evaluation pipeline.
//!
//! This module defines the sparse preference store that every other
//! component reads and writes. Users and items are opaque integer keys
//! from disjoint namespaces; a preference is a (user, item, score)
//! observation, optionally annotated with one or more timestamps.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with item IDs

/// Unique identifier for a user
pub type UserId = u64;

/// Unique identifier for an item
pub type ItemId = u64;

// =============================================================================
// Preference
// =============================================================================

/// A single (user, item, score) observation.
///
/// Small, copyable struct; the store keeps at most one preference value
/// per (user, item) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub score: f64,
}

// =============================================================================
// PreferenceStore - The Core Sparse Store
// =============================================================================

/// Sparse in-memory store of user -> item -> preference plus the
/// per-pair timestamp multiset.
///
/// Invariants:
/// - at most one preference value per (user, item) pair; a later
///   `add_preference` for the same pair overwrites the prior value
/// - timestamps form a multiset per pair (repeated interactions with
///   the same item at different times are all kept)
///
/// Backing maps are ordered so that downstream seeded shuffles observe
/// a stable base ordering regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceStore {
    /// user -> item -> preference score
    preferences: BTreeMap<UserId, BTreeMap<ItemId, f64>>,
    /// user -> item -> timestamps (multiset, insertion order)
    timestamps: BTreeMap<UserId, BTreeMap<ItemId, Vec<i64>>>,
    /// items that appear with at least one preference
    items: BTreeSet<ItemId>,
}

impl PreferenceStore {
    /// Creates a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    // Mutators

    /// Insert a preference, overwriting any prior value for the pair.
    ///
    /// Last-write-wins; never fails.
    pub fn add_preference(&mut self, user: UserId, item: ItemId, score: f64) {
        self.preferences.entry(user).or_default().insert(item, score);
        self.items.insert(item);
    }

    /// Append a timestamp to the pair's timestamp multiset.
    ///
    /// A timestamp may be added for a pair that has no preference; the
    /// store does not enforce the caller contract that timestamps only
    /// accompany preference adds.
    pub fn add_timestamp(&mut self, user: UserId, item: ItemId, t: i64) {
        self.timestamps
            .entry(user)
            .or_default()
            .entry(item)
            .or_default()
            .push(t);
    }

    /// Reset the store to the empty state
    pub fn clear(&mut self) {
        self.preferences.clear();
        self.timestamps.clear();
        self.items.clear();
    }

    // Views - these return references into the store

    /// Full user -> item -> score view
    pub fn user_item_preferences(&self) -> &BTreeMap<UserId, BTreeMap<ItemId, f64>> {
        &self.preferences
    }

    /// Full user -> item -> timestamp-multiset view
    pub fn user_item_timestamps(&self) -> &BTreeMap<UserId, BTreeMap<ItemId, Vec<i64>>> {
        &self.timestamps
    }

    /// The preference score for a pair, if one exists
    pub fn preference(&self, user: UserId, item: ItemId) -> Option<f64> {
        self.preferences.get(&user).and_then(|m| m.get(&item)).copied()
    }

    /// The timestamps recorded for a pair
    ///
    /// Returns an empty slice if the pair has none.
    pub fn timestamps(&self, user: UserId, item: ItemId) -> &[i64] {
        self.timestamps
            .get(&user)
            .and_then(|m| m.get(&item))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The items a user has at least one preference for
    pub fn items_rated_by(&self, user: UserId) -> impl Iterator<Item = ItemId> + '_ {
        self.preferences
            .get(&user)
            .into_iter()
            .flat_map(|m| m.keys().copied())
    }

    // Counts - users/items that appear with at least one preference

    /// Users with at least one preference, in ascending id order
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.preferences.keys().copied()
    }

    /// Items with at least one preference, in ascending id order
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    pub fn num_users(&self) -> usize {
        self.preferences.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Total number of (user, item) preference pairs
    pub fn num_preferences(&self) -> usize {
        self.preferences.values().map(|m| m.len()).sum()
    }

    /// Iterate every preference in (user, item) order
    pub fn iter_preferences(&self) -> impl Iterator<Item = Preference> + '_ {
        self.preferences.iter().flat_map(|(&user_id, items)| {
            items.iter().map(move |(&item_id, &score)| Preference {
                user_id,
                item_id,
                score,
            })
        })
    }

    /// Copy one (user, item) pair - preference and timestamps - into `dst`.
    ///
    /// This is the primitive the splitters use to move a pair to one
    /// side of a split; timestamps travel with their preference.
    pub fn copy_pair_into(&self, dst: &mut PreferenceStore, user: UserId, item: ItemId) {
        if let Some(score) = self.preference(user, item) {
            dst.add_preference(user, item, score);
        }
        for &t in self.timestamps(user, item) {
            dst.add_timestamp(user, item, t);
        }
    }
}
