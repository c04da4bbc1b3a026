//! Prediction-error metrics (MAE, RMSE) and missing-value strategies.
//!
//! The shared reduction turns (predictions, test) into a per-user list
//! of (actual - predicted) differences, governed by `ErrorStrategy`
//! when a test pair has no prediction. Coverage counters are
//! accumulated as a side effect for diagnostic reporting.

pub mod mae;
pub mod rmse;

pub use mae::Mae;
pub use rmse::Rmse;

use anyhow::{anyhow, Result};
use pref_store::{PreferenceStore, UserId};
use std::collections::BTreeMap;

/// What to do when a test (user, item) pair has no prediction.
///
/// A stored prediction of NaN is treated exactly like an absent one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorStrategy {
    /// Include the pair as NaN (propagates into the aggregates)
    ConsiderEverything,
    /// Drop the pair from aggregation (default)
    NotConsiderNan,
    /// Substitute the prediction with a literal constant
    ConsiderNanAs(f64),
}

impl Default for ErrorStrategy {
    fn default() -> Self {
        ErrorStrategy::NotConsiderNan
    }
}

impl std::str::FromStr for ErrorStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "consider_everything" => Ok(ErrorStrategy::ConsiderEverything),
            "not_consider_nan" => Ok(ErrorStrategy::NotConsiderNan),
            _ => match lower.strip_prefix("consider_nan_as_") {
                Some(suffix) => suffix
                    .parse::<f64>()
                    .map(ErrorStrategy::ConsiderNanAs)
                    .map_err(|_| anyhow!("Unknown error strategy: {}", s)),
                None => Err(anyhow!("Unknown error strategy: {}", s)),
            },
        }
    }
}

/// Diagnostic counters accumulated by the difference pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    /// Test users absent from the predictions
    pub empty_users: usize,
    /// Test items absent from a present user's predictions
    pub empty_items: usize,
}

/// The `AbstractErrorMetric` reduction: per test user, the list of
/// (actual - predicted) differences under `strategy`.
///
/// A test user absent from the predictions counts once in
/// `empty_users` and its items are handled by the strategy without
/// inflating `empty_items`.
pub(crate) fn per_user_differences(
    predictions: &PreferenceStore,
    test: &PreferenceStore,
    strategy: ErrorStrategy,
) -> (BTreeMap<UserId, Vec<f64>>, Coverage) {
    let mut differences: BTreeMap<UserId, Vec<f64>> = BTreeMap::new();
    let mut coverage = Coverage::default();

    for (&user, items) in test.user_item_preferences() {
        let user_predictions = predictions.user_item_preferences().get(&user);
        if user_predictions.is_none() {
            coverage.empty_users += 1;
        }

        let diffs = differences.entry(user).or_default();
        for (&item, &actual) in items {
            let predicted = user_predictions
                .and_then(|m| m.get(&item))
                .copied()
                .filter(|p| !p.is_nan());

            match predicted {
                Some(p) => diffs.push(actual - p),
                None => {
                    if user_predictions.is_some() {
                        coverage.empty_items += 1;
                    }
                    match strategy {
                        ErrorStrategy::ConsiderEverything => diffs.push(f64::NAN),
                        ErrorStrategy::NotConsiderNan => {}
                        ErrorStrategy::ConsiderNanAs(c) => diffs.push(actual - c),
                    }
                }
            }
        }
    }

    (differences, coverage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (PreferenceStore, PreferenceStore) {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, 2.0);

        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 4.0);
        test.add_preference(1, 2, 1.0); // unpredicted
        (predictions, test)
    }

    #[test]
    fn test_not_consider_nan_drops_missing() {
        let (predictions, test) = fixture();
        let (diffs, coverage) =
            per_user_differences(&predictions, &test, ErrorStrategy::NotConsiderNan);

        assert_eq!(diffs[&1], vec![2.0]);
        assert_eq!(coverage.empty_items, 1);
        assert_eq!(coverage.empty_users, 0);
    }

    #[test]
    fn test_consider_nan_as_zero_substitutes() {
        let (predictions, test) = fixture();
        let (diffs, _) =
            per_user_differences(&predictions, &test, ErrorStrategy::ConsiderNanAs(0.0));

        assert_eq!(diffs[&1], vec![2.0, 1.0]);
    }

    #[test]
    fn test_consider_everything_propagates_nan() {
        let (predictions, test) = fixture();
        let (diffs, _) =
            per_user_differences(&predictions, &test, ErrorStrategy::ConsiderEverything);

        assert_eq!(diffs[&1].len(), 2);
        assert_eq!(diffs[&1][0], 2.0);
        assert!(diffs[&1][1].is_nan());
    }

    #[test]
    fn test_absent_user_counts_once() {
        let predictions = PreferenceStore::new();
        let mut test = PreferenceStore::new();
        test.add_preference(5, 1, 4.0);
        test.add_preference(5, 2, 3.0);

        let (_, coverage) =
            per_user_differences(&predictions, &test, ErrorStrategy::NotConsiderNan);
        assert_eq!(coverage.empty_users, 1);
        assert_eq!(coverage.empty_items, 0);
    }

    #[test]
    fn test_nan_prediction_is_treated_as_missing() {
        let mut predictions = PreferenceStore::new();
        predictions.add_preference(1, 1, f64::NAN);
        let mut test = PreferenceStore::new();
        test.add_preference(1, 1, 4.0);

        let (diffs, coverage) =
            per_user_differences(&predictions, &test, ErrorStrategy::NotConsiderNan);
        assert!(diffs[&1].is_empty());
        assert_eq!(coverage.empty_items, 1);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "not_consider_nan".parse::<ErrorStrategy>().unwrap(),
            ErrorStrategy::NotConsiderNan
        );
        assert_eq!(
            "consider_nan_as_3".parse::<ErrorStrategy>().unwrap(),
            ErrorStrategy::ConsiderNanAs(3.0)
        );
        assert!("drop_them".parse::<ErrorStrategy>().is_err());
    }
}
