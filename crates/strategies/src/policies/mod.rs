//! Candidate-selection policy implementations.
//!
//! One module per policy; all implement `CandidateStrategy`.

pub mod all_items;
pub mod rel_plus_n;
pub mod test_items;
pub mod train_items;

pub use all_items::AllItems;
pub use rel_plus_n::{RankingTask, RelPlusN};
pub use test_items::TestItems;
pub use train_items::TrainItems;
pub use user_test::UserTest;

#[cfg(test)]
pub(crate) mod test_fixtures {
    use pref_store::{IndexedPreferenceStore, PreferenceStore};
    use std::sync::Arc;

    /// Shared fixture: training universe {1,2,3}, test universe {4,5}.
    ///
    /// User 1 rated items 1,2 in training and 4 in test; user 2 rated
    /// item 3 in training and 5 in test.
    pub fn fixture_stores() -> (Arc<IndexedPreferenceStore>, Arc<IndexedPreferenceStore>) {
        let mut training = PreferenceStore::new();
        training.add_preference(1, 1, 4.0);
        training.add_preference(1, 2, 3.0);
        training.add_preference(2, 3, 5.0);

        let mut test = PreferenceStore::new();
        test.add_preference(1, 4, 5.0);
        test.add_preference(2, 5, 2.0);

        (
            Arc::new(IndexedPreferenceStore::from_store(&training)),
            Arc::new(IndexedPreferenceStore::from_store(&test)),
        )
    }
}
