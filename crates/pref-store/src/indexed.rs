//! Read-optimised preference store with an explicit two-state lifecycle.
//!
//! `IndexedPreferenceStore` accepts writes while `Building`, then
//! `freeze()` compiles an index (item universe, per-user rated sets,
//! per-item popularity counts) and the store becomes read-only. Writes
//! after the freeze and reads before it are usage errors and fail
//! loudly; they are never silently ignored.
//!
//! Candidate strategies use the frozen universe for cheap set
//! differences; novelty metrics use the popularity counts.

use crate::error::{Result, StoreError};
use crate::types::{ItemId, PreferenceStore, UserId};
use std::collections::{BTreeMap, BTreeSet};

/// Index compiled by `freeze()`.
#[derive(Debug, Clone, Default)]
struct Index {
    users: BTreeSet<UserId>,
    items: BTreeSet<ItemId>,
    /// user -> items the user has rated
    rated: BTreeMap<UserId, BTreeSet<ItemId>>,
    /// user -> item -> score
    preferences: BTreeMap<UserId, BTreeMap<ItemId, f64>>,
    /// item -> number of distinct users that rated it
    popularity: BTreeMap<ItemId, usize>,
}

#[derive(Debug, Clone)]
enum State {
    Building(PreferenceStore),
    Frozen(Index),
}

/// Two-state preference store: mutable while `Building`, immutable and
/// indexed once `Frozen`.
#[derive(Debug, Clone)]
pub struct IndexedPreferenceStore {
    state: State,
}

impl IndexedPreferenceStore {
    /// Create an empty store in the `Building` state
    pub fn new() -> Self {
        Self {
            state: State::Building(PreferenceStore::new()),
        }
    }

    /// Build a frozen store from an existing `PreferenceStore` in one step
    pub fn from_store(store: &PreferenceStore) -> Self {
        Self {
            state: State::Frozen(Self::build_index(store)),
        }
    }

    fn build_index(store: &PreferenceStore) -> Index {
        let mut index = Index::default();
        for (&user, items) in store.user_item_preferences() {
            index.users.insert(user);
            let rated = index.rated.entry(user).or_default();
            for (&item, &score) in items {
                index.items.insert(item);
                rated.insert(item);
                *index.popularity.entry(item).or_insert(0) += 1;
                index.preferences.entry(user).or_default().insert(item, score);
            }
        }
        index
    }

    /// Insert a preference while still building.
    ///
    /// Returns `StoreError::ModelAlreadyBuilt` once the store is frozen.
    pub fn add_preference(&mut self, user: UserId, item: ItemId, score: f64) -> Result<()> {
        match &mut self.state {
            State::Building(store) => {
                store.add_preference(user, item, score);
                Ok(())
            }
            State::Frozen(_) => Err(StoreError::ModelAlreadyBuilt),
        }
    }

    /// Compile the index and switch to the `Frozen` state.
    ///
    /// Idempotent: freezing a frozen store is a no-op.
    pub fn freeze(&mut self) {
        if let State::Building(store) = &self.state {
            self.state = State::Frozen(Self::build_index(store));
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, State::Frozen(_))
    }

    fn index(&self) -> Result<&Index> {
        match &self.state {
            State::Frozen(index) => Ok(index),
            State::Building(_) => Err(StoreError::ModelNotBuilt),
        }
    }

    // Read accessors - all

    /// All users with at least one preference
    pub fn users(&self) -> Result<&BTreeSet<UserId>> {
        Ok(&self.index()?.users)
    }

    /// The item universe: every item with at least one preference
    pub fn item_universe(&self) -> Result<&BTreeSet<ItemId>> {
        Ok(&self.index()?.items)
    }

    pub fn num_users(&self) -> Result<usize> {
        Ok(self.index()?.users.len())
    }

    pub fn num_items(&self) -> Result<usize> {
        Ok(self.index()?.items.len())
    }

    /// Items rated by `user`; empty set reference for unknown users
    pub fn rated_by(&self, user: UserId) -> Result<Option<&BTreeSet<ItemId>>> {
        Ok(self.index()?.rated.get(&user))
    }

    /// The preference score for a pair, if one exists
    pub fn preference(&self, user: UserId, item: ItemId) -> Result<Option<f64>> {
        Ok(self
            .index()?
            .preferences
            .get(&user)
            .and_then(|m| m.get(&item))
            .copied())
    }

    /// user -> item -> score view of the frozen store
    pub fn user_item_preferences(&self) -> Result<&BTreeMap<UserId, BTreeMap<ItemId, f64>>> {
        Ok(&self.index()?.preferences)
    }

    /// Number of distinct users that rated `item` (0 for unseen items)
    pub fn popularity(&self, item: ItemId) -> Result<usize> {
        Ok(self.index()?.popularity.get(&item).copied().unwrap_or(0))
    }
}

impl Default for IndexedPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_freeze_then_read() {
        let mut store = IndexedPreferenceStore::new();
        store.add_preference(1, 10, 4.0).unwrap();
        store.add_preference(2, 10, 3.0).unwrap();
        store.add_preference(1, 20, 5.0).unwrap();
        store.freeze();

        assert_eq!(store.num_users().unwrap(), 2);
        assert_eq!(store.num_items().unwrap(), 2);
        assert_eq!(store.popularity(10).unwrap(), 2);
        assert_eq!(store.popularity(20).unwrap(), 1);
        assert_eq!(store.popularity(99).unwrap(), 0);
        assert_eq!(store.preference(1, 20).unwrap(), Some(5.0));
    }

    #[test]
    fn test_write_after_freeze_is_a_usage_error() {
        let mut store = IndexedPreferenceStore::new();
        store.add_preference(1, 10, 4.0).unwrap();
        store.freeze();

        let err = store.add_preference(1, 11, 2.0).unwrap_err();
        assert!(matches!(err, StoreError::ModelAlreadyBuilt));
    }

    #[test]
    fn test_read_before_freeze_is_a_usage_error() {
        let mut store = IndexedPreferenceStore::new();
        store.add_preference(1, 10, 4.0).unwrap();

        let err = store.num_users().unwrap_err();
        assert!(matches!(err, StoreError::ModelNotBuilt));
    }

    #[test]
    fn test_from_store_is_frozen() {
        let mut plain = PreferenceStore::new();
        plain.add_preference(1, 10, 4.0);
        plain.add_preference(1, 10, 2.0); // overwrite, still one rater

        let store = IndexedPreferenceStore::from_store(&plain);
        assert!(store.is_frozen());
        assert_eq!(store.popularity(10).unwrap(), 1);
        assert_eq!(store.preference(1, 10).unwrap(), Some(2.0));
    }
}
