//! Candidates drawn from both stores' item universes.

use crate::traits::{universe_minus_training, CandidateStrategy};
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, ItemId, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Every item in either store's universe, minus the user's own
/// training ratings.
pub struct AllItems {
    training: Arc<IndexedPreferenceStore>,
    test: Arc<IndexedPreferenceStore>,
}

impl AllItems {
    pub fn new(training: Arc<IndexedPreferenceStore>, test: Arc<IndexedPreferenceStore>) -> Self {
        Self { training, test }
    }
}

impl CandidateStrategy for AllItems {
    fn name(&self) -> &str {
        "AllItems"
    }

    fn candidate_items(&self, user: UserId) -> Result<BTreeSet<ItemId>> {
        let mut candidates = universe_minus_training(&self.training, &self.training, user)?;
        candidates.extend(universe_minus_training(&self.test, &self.training, user)?);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::test_fixtures::fixture_stores;

    #[test]
    fn test_all_items_unions_both_universes() {
        let (training, test) = fixture_stores();
        let strategy = AllItems::new(training, test);

        // User 1 rated 1,2 in training; universes are {1,2,3} and {4,5}
        let candidates = strategy.candidate_items(1).unwrap();
        assert_eq!(candidates, BTreeSet::from([3, 4, 5]));
    }

    #[test]
    fn test_unknown_user_gets_full_universe() {
        let (training, test) = fixture_stores();
        let strategy = AllItems::new(training, test);

        let candidates = strategy.candidate_items(99).unwrap();
        assert_eq!(candidates, BTreeSet::from([1, 2, 3, 4, 5]));
    }
}
