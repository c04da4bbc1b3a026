//! # Pref Store Crate
//!
//! Sparse preference data model for the evaluation pipeline.
//!
//! ## Main Components
//!
//! - **types**: `PreferenceStore` - user -> item -> score plus the
//!   per-pair timestamp multiset
//! - **indexed**: `IndexedPreferenceStore` - read-optimised backend with
//!   a Building/Frozen lifecycle
//! - **parser**: tab-delimited boundary file readers and writers
//! - **error**: error types shared by the stores and parsers
//!
//! ## Example Usage
//!
//! ```ignore
//! use pref_store::{PreferenceStore, parser};
//! use std::path::Path;
//!
//! let data = parser::read_preferences(Path::new("ratings.tsv"))?;
//! println!(
//!     "{} users, {} items, {} preferences",
//!     data.num_users(),
//!     data.num_items(),
//!     data.num_preferences()
//! );
//! ```

// Public modules
pub mod error;
pub mod indexed;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Result, StoreError};
pub use indexed::IndexedPreferenceStore;
pub use types::{ItemId, Preference, PreferenceStore, UserId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_creation() {
        let store = PreferenceStore::new();
        assert_eq!(store.num_users(), 0);
        assert_eq!(store.num_items(), 0);
    }

    #[test]
    fn test_preference_iteration_order() {
        let mut store = PreferenceStore::new();
        store.add_preference(2, 20, 1.0);
        store.add_preference(1, 30, 2.0);
        store.add_preference(1, 10, 3.0);

        let pairs: Vec<(UserId, ItemId)> = store
            .iter_preferences()
            .map(|p| (p.user_id, p.item_id))
            .collect();
        assert_eq!(pairs, vec![(1, 10), (1, 30), (2, 20)]);
    }
}
