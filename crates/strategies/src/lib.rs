//! # Strategies Crate
//!
//! Candidate-selection ("evaluation strategy") policies: given the
//! training and test stores and a relevance threshold, decide which
//! items must be scored/ranked for each user, and format rankings and
//! ground truth for output.
//!
//! ## Components
//!
//! - **traits**: the `CandidateStrategy` trait
//! - **policies**: AllItems, TrainItems, TestItems, UserTest, RelPlusN
//! - **format**: Simple and trec_eval output modes
//!
//! ## Example Usage
//!
//! ```ignore
//! use strategies::{StrategyKind, build_strategy};
//! use std::sync::Arc;
//!
//! let kind: StrategyKind = "rel-plus-n".parse()?;
//! let strategy = build_strategy(kind, training, test, 4.0, Some((100, 42)))?;
//! let candidates = strategy.candidate_items(7)?;
//! ```

pub mod format;
pub mod policies;
pub mod traits;

// Re-export main types
pub use format::{ranked_scores, write_ground_truth, write_ranking, OutputFormat};
pub use policies::{AllItems, RankingTask, RelPlusN, TestItems, TrainItems, UserTest};
pub use traits::CandidateStrategy;

use anyhow::{anyhow, Result};
use pref_store::IndexedPreferenceStore;
use std::sync::Arc;

/// Closed enumeration of the known strategy kinds.
///
/// Replaces by-name reflection: the configuration surface parses a
/// string into a `StrategyKind`, and `build_strategy` maps it to a
/// constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    AllItems,
    TrainItems,
    TestItems,
    UserTest,
    RelPlusN,
}

impl std::str::FromStr for StrategyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all-items" | "allitems" => Ok(StrategyKind::AllItems),
            "train-items" | "trainitems" => Ok(StrategyKind::TrainItems),
            "test-items" | "testitems" => Ok(StrategyKind::TestItems),
            "user-test" | "usertest" => Ok(StrategyKind::UserTest),
            "rel-plus-n" | "relplusn" => Ok(StrategyKind::RelPlusN),
            other => Err(anyhow!("Unknown candidate strategy: {}", other)),
        }
    }
}

/// Build a strategy from its kind and the shared evaluation inputs.
///
/// `rel_plus_n` carries the (N, seed) pair and is required for
/// `StrategyKind::RelPlusN`; a missing parameter set is a
/// configuration error, not a default.
pub fn build_strategy(
    kind: StrategyKind,
    training: Arc<IndexedPreferenceStore>,
    test: Arc<IndexedPreferenceStore>,
    threshold: f64,
    rel_plus_n: Option<(usize, u64)>,
) -> Result<Box<dyn CandidateStrategy>> {
    Ok(match kind {
        StrategyKind::AllItems => Box::new(AllItems::new(training, test)),
        StrategyKind::TrainItems => Box::new(TrainItems::new(training)),
        StrategyKind::TestItems => Box::new(TestItems::new(training, test)),
        StrategyKind::UserTest => Box::new(UserTest::new(test)),
        StrategyKind::RelPlusN => {
            let (n, seed) = rel_plus_n
                .ok_or_else(|| anyhow!("RelPlusN requires N and a seed"))?;
            Box::new(RelPlusN::new(training, test, threshold, n, seed))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("all-items".parse::<StrategyKind>().unwrap(), StrategyKind::AllItems);
        assert_eq!("RelPlusN".parse::<StrategyKind>().unwrap(), StrategyKind::RelPlusN);
        assert!("nearest-items".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_rel_plus_n_requires_parameters() {
        let training = Arc::new(IndexedPreferenceStore::from_store(&Default::default()));
        let test = Arc::new(IndexedPreferenceStore::from_store(&Default::default()));
        let err = build_strategy(StrategyKind::RelPlusN, training, test, 4.0, None);
        assert!(err.is_err());
    }
}
