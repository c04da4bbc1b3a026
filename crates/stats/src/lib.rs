//! # Stats Crate
//!
//! Cross-system statistical significance over per-user (or per-topic)
//! metric values: paired t-tests, confidence intervals and effect
//! sizes.
//!
//! Every operation takes two (or more) value maps keyed by the same
//! identifier set. Keys present in one system but not the other are an
//! input-validation error, never silently dropped - a mismatched key
//! set means the systems were not evaluated on the same users.
//!
//! ## Example Usage
//!
//! ```ignore
//! use stats::paired_t_test;
//!
//! let result = paired_t_test(&baseline, &contender)?;
//! if result.p_value < 0.05 {
//!     println!("difference is significant (p = {:.4})", result.p_value);
//! }
//! ```

pub mod tdist;

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors raised by the significance computations.
#[derive(Error, Debug, PartialEq)]
pub enum StatsError {
    /// The two systems were not evaluated over the same identifiers
    #[error(
        "Mismatched key sets: {only_in_a} keys only in system A, {only_in_b} only in system B"
    )]
    KeyMismatch { only_in_a: usize, only_in_b: usize },

    /// Fewer than two matched observations
    #[error("Need at least {needed} observations, got {got}")]
    TooFewSamples { needed: usize, got: usize },

    /// Significance level outside (0, 1)
    #[error("Alpha must lie in (0, 1), got {0}")]
    InvalidAlpha(f64),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Result of a paired t-test between two systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedTTest {
    pub n: usize,
    pub mean_difference: f64,
    pub std_error: f64,
    pub t_statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
}

/// Align two keyed value maps into paired vectors.
///
/// Fails with `KeyMismatch` unless the key sets are identical.
fn aligned<K: Ord>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> Result<(Vec<f64>, Vec<f64>)> {
    let only_in_a = a.keys().filter(|k| !b.contains_key(k)).count();
    let only_in_b = b.keys().filter(|k| !a.contains_key(k)).count();
    if only_in_a > 0 || only_in_b > 0 {
        return Err(StatsError::KeyMismatch { only_in_a, only_in_b });
    }
    let values_a: Vec<f64> = a.values().copied().collect();
    let values_b: Vec<f64> = b.values().copied().collect();
    Ok((values_a, values_b))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (n - 1 denominator).
fn sample_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64
}

fn differences(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

fn require_samples(got: usize, needed: usize) -> Result<()> {
    if got < needed {
        return Err(StatsError::TooFewSamples { needed, got });
    }
    Ok(())
}

fn check_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(StatsError::InvalidAlpha(alpha));
    }
    Ok(())
}

/// Paired t-test over two aligned per-user value maps.
pub fn paired_t_test<K: Ord>(
    a: &BTreeMap<K, f64>,
    b: &BTreeMap<K, f64>,
) -> Result<PairedTTest> {
    let (values_a, values_b) = aligned(a, b)?;
    require_samples(values_a.len(), 2)?;

    let diffs = differences(&values_a, &values_b);
    let n = diffs.len();
    let mean_difference = mean(&diffs);
    let std_error = (sample_variance(&diffs) / n as f64).sqrt();
    let t_statistic = if std_error > 0.0 {
        mean_difference / std_error
    } else {
        0.0
    };
    let p_value = tdist::two_tailed_p(t_statistic, (n - 1) as f64);

    debug!(
        "paired t-test: n = {}, t = {:.4}, p = {:.6}",
        n, t_statistic, p_value
    );
    Ok(PairedTTest {
        n,
        mean_difference,
        std_error,
        t_statistic,
        p_value,
    })
}

/// Standard error of the paired difference.
pub fn standard_error<K: Ord>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> Result<f64> {
    let (values_a, values_b) = aligned(a, b)?;
    require_samples(values_a.len(), 2)?;
    let diffs = differences(&values_a, &values_b);
    Ok((sample_variance(&diffs) / diffs.len() as f64).sqrt())
}

/// Confidence interval of the paired mean difference at significance
/// `alpha` (e.g. 0.05 for a 95% interval).
pub fn confidence_interval_paired<K: Ord>(
    alpha: f64,
    a: &BTreeMap<K, f64>,
    b: &BTreeMap<K, f64>,
) -> Result<(f64, f64)> {
    check_alpha(alpha)?;
    let test = paired_t_test(a, b)?;
    let critical = tdist::critical_value(alpha, (test.n - 1) as f64);
    let margin = critical * test.std_error;
    Ok((test.mean_difference - margin, test.mean_difference + margin))
}

/// Confidence interval of the difference of means under the
/// independent-samples (pooled variance) model.
pub fn confidence_interval_independent<K: Ord>(
    alpha: f64,
    a: &BTreeMap<K, f64>,
    b: &BTreeMap<K, f64>,
) -> Result<(f64, f64)> {
    check_alpha(alpha)?;
    require_samples(a.len(), 2)?;
    require_samples(b.len(), 2)?;

    let values_a: Vec<f64> = a.values().copied().collect();
    let values_b: Vec<f64> = b.values().copied().collect();
    let (n1, n2) = (values_a.len() as f64, values_b.len() as f64);
    let pooled_variance = ((n1 - 1.0) * sample_variance(&values_a)
        + (n2 - 1.0) * sample_variance(&values_b))
        / (n1 + n2 - 2.0);
    let std_error = (pooled_variance * (1.0 / n1 + 1.0 / n2)).sqrt();
    let critical = tdist::critical_value(alpha, n1 + n2 - 2.0);
    let difference = mean(&values_a) - mean(&values_b);
    let margin = critical * std_error;
    Ok((difference - margin, difference + margin))
}

/// Per-system confidence interval of the mean, for an array of systems.
pub fn confidence_intervals<K: Ord>(
    alpha: f64,
    systems: &[&BTreeMap<K, f64>],
) -> Result<Vec<(f64, f64)>> {
    check_alpha(alpha)?;
    let mut intervals = Vec::with_capacity(systems.len());
    for system in systems {
        require_samples(system.len(), 2)?;
        let values: Vec<f64> = system.values().copied().collect();
        let n = values.len() as f64;
        let std_error = (sample_variance(&values) / n).sqrt();
        let critical = tdist::critical_value(alpha, n - 1.0);
        let m = mean(&values);
        intervals.push((m - critical * std_error, m + critical * std_error));
    }
    Ok(intervals)
}

/// Cohen's d with the pooled standard deviation, from aligned raw
/// per-user vectors.
pub fn cohens_d<K: Ord>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> Result<f64> {
    let (values_a, values_b) = aligned(a, b)?;
    require_samples(values_a.len(), 2)?;
    let n = values_a.len() as f64;
    Ok(cohens_d_from_summary(
        n,
        mean(&values_a),
        sample_variance(&values_a).sqrt(),
        n,
        mean(&values_b),
        sample_variance(&values_b).sqrt(),
    ))
}

/// Cohen's d with the pooled standard deviation, from summary
/// statistics of each system.
pub fn cohens_d_from_summary(
    n1: f64,
    mean1: f64,
    std_dev1: f64,
    n2: f64,
    mean2: f64,
    std_dev2: f64,
) -> f64 {
    let pooled = (((n1 - 1.0) * std_dev1 * std_dev1 + (n2 - 1.0) * std_dev2 * std_dev2)
        / (n1 + n2 - 2.0))
        .sqrt();
    (mean1 - mean2) / pooled
}

/// Least-squares effect size: mean difference over the root mean
/// variance of the two systems.
pub fn cohens_d_ls<K: Ord>(a: &BTreeMap<K, f64>, b: &BTreeMap<K, f64>) -> Result<f64> {
    let (values_a, values_b) = aligned(a, b)?;
    require_samples(values_a.len(), 2)?;
    Ok(cohens_d_ls_from_summary(
        mean(&values_a),
        sample_variance(&values_a).sqrt(),
        mean(&values_b),
        sample_variance(&values_b).sqrt(),
    ))
}

/// Least-squares effect size from summary statistics.
pub fn cohens_d_ls_from_summary(mean1: f64, std_dev1: f64, mean2: f64, std_dev2: f64) -> f64 {
    (mean1 - mean2) / ((std_dev1 * std_dev1 + std_dev2 * std_dev2) / 2.0).sqrt()
}
