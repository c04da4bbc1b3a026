//! # Splitters Crate
//!
//! This crate partitions a `PreferenceStore` into (training, test)
//! pairs for evaluation.
//!
//! ## Components
//!
//! ### RandomSplitter
//! Seeded shuffle-and-cut split, per user, per item or global:
//! one (training, test) pair.
//!
//! ### CrossValidationSplitter
//! Seeded round-robin bucketing into `n_folds` complementary pairs:
//! every pair is test in exactly one fold and training in the rest.
//!
//! ### TemporalSplitter
//! Deterministic timestamp-window split (no RNG): the earliest
//! `train_fraction` of distinct timestamps defines training time,
//! the remainder the test window.
//!
//! ## Common contract
//!
//! The input store is never mutated; output stores are owned by the
//! caller. Within each pair, every (user, item, score) preference of
//! the input lands on exactly one side, and timestamps travel with
//! their preference.
//!
//! ## Example Usage
//!
//! ```ignore
//! use splitters::{CrossValidationSplitter, Splitter};
//!
//! let splitter = CrossValidationSplitter::new(5, true, 42);
//! for (fold, pair) in splitter.split(&data).iter().enumerate() {
//!     println!(
//!         "fold {}: {} train / {} test preferences",
//!         fold,
//!         pair.training.num_preferences(),
//!         pair.test.num_preferences()
//!     );
//! }
//! ```

pub mod cross_validation;
pub mod random;
pub mod temporal;

// Re-export main types
pub use cross_validation::CrossValidationSplitter;
pub use random::RandomSplitter;
pub use temporal::TemporalSplitter;

use pref_store::PreferenceStore;

/// One (training, test) pair produced by a splitter.
#[derive(Debug, Clone, Default)]
pub struct SplitPair {
    pub training: PreferenceStore,
    pub test: PreferenceStore,
}

/// Core trait for split algorithms.
///
/// ## Design Note
/// - `Send + Sync` allows splitters to be driven from parallel fold
///   pipelines
/// - every `split` call derives its own RNG from the configured seed,
///   so repeated calls are reproducible and splitter instances carry
///   no mutable state
pub trait Splitter: Send + Sync {
    /// Returns the name of this splitter (for logging/debugging)
    fn name(&self) -> &str;

    /// Partition `data` into one or more (training, test) pairs.
    fn split(&self, data: &PreferenceStore) -> Vec<SplitPair>;
}

/// Index cut shared by the shuffle-based splitters: `round(fraction * n)`.
pub(crate) fn cut_point(fraction: f64, n: usize) -> usize {
    (fraction * n as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_point_rounds() {
        assert_eq!(cut_point(0.8, 10), 8);
        assert_eq!(cut_point(0.5, 3), 2); // round(1.5) = 2
        assert_eq!(cut_point(0.0, 10), 0);
        assert_eq!(cut_point(1.0, 10), 10);
    }
}
