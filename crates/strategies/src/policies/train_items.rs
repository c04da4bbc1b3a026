//! Candidates restricted to the training store's universe.

use crate::traits::{universe_minus_training, CandidateStrategy};
use anyhow::Result;
use pref_store::{IndexedPreferenceStore, ItemId, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Training-universe items the user has not rated in training.
pub struct TrainItems {
    training: Arc<IndexedPreferenceStore>,
}

impl TrainItems {
    pub fn new(training: Arc<IndexedPreferenceStore>) -> Self {
        Self { training }
    }
}

impl CandidateStrategy for TrainItems {
    fn name(&self) -> &str {
        "TrainItems"
    }

    fn candidate_items(&self, user: UserId) -> Result<BTreeSet<ItemId>> {
        universe_minus_training(&self.training, &self.training, user)
    }
}
