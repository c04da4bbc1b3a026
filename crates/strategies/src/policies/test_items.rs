//! Candidates restricted to the test store's universe.

use crate::traits::{universe_minus_training, CandidateStrategy};
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, ItemId, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Test-universe items the user has not rated in training.
///
/// The user's own held-out test items remain in the set - they are the
/// ground truth the ranking is scored against.
pub struct TestItems {
    training: Arc<IndexedPreferenceStore>,
    test: Arc<IndexedPreferenceStore>,
}

impl TestItems {
    pub fn new(training: Arc<IndexedPreferenceStore>, test: Arc<IndexedPreferenceStore>) -> Self {
        Self { training, test }
    }
}

impl CandidateStrategy for TestItems {
    fn name(&self) -> &str {
        "TestItems"
    }

    fn candidate_items(&self, user: UserId) -> Result<BTreeSet<ItemId>> {
        universe_minus_training(&self.test, &self.training, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::test_fixtures::fixture_stores;

    #[test]
    fn test_difference_is_against_training_ratings() {
        let (training, test) = fixture_stores();
        let strategy = TestItems::new(training, test);

        // User 1's own test item 4 stays rankable; the difference only
        // removes training ratings (1, 2 are not in the test universe)
        let candidates = strategy.candidate_items(1).unwrap();
        assert_eq!(candidates, BTreeSet::from([4, 5]));
    }
}
