//! # Metrics Crate
//!
//! The metric-computation engine: reduces (predictions, test) pairs -
//! plus the training store and an item-distance function where needed -
//! into a global scalar and a per-user breakdown per requested metric.
//!
//! ## Components
//!
//! - **error_metrics**: MAE / RMSE with missing-prediction strategies
//!   and coverage counters
//! - **ranking**: Precision / Recall / nDCG / MAP / MRR at cutoffs
//! - **novelty**: EPC / EFD from training popularity
//! - **diversity**: EILD / EPD over an `ItemDistance`, plus the joint
//!   AggrDiv / GiniIndex exposure metrics
//!
//! ## Example Usage
//!
//! ```ignore
//! use metrics::{build_metric, MetricInputs, MetricKind};
//!
//! let mut metric = build_metric(MetricKind::Ndcg, &inputs)?;
//! metric.compute();
//! println!("{} = {:.4}", metric.name(), metric.value());
//! ```

pub mod diversity;
pub mod error_metrics;
pub mod novelty;
pub mod ranking;

// Re-export main types
pub use diversity::{
    AggrDiv, Eild, Epd, GiniIndex, ItemDistance, JaccardItemDistance, StoredItemDistance,
};
pub use error_metrics::{Coverage, ErrorStrategy, Mae, Rmse};
pub use novelty::{Efd, Epc};
pub use ranking::{Map, Mrr, Ndcg, Precision, Recall};

use anyhow::{anyhow, Result};
use pref_store::{IndexedPreferenceStore, PreferenceStore, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Common surface of every metric.
///
/// `compute()` is idempotent: once a value has been computed the stored
/// model is immutable and further calls are no-ops. `value()` is NaN
/// until `compute()` has run.
pub trait EvaluationMetric: Send + Sync {
    /// Display name, including the cutoff where one applies
    fn name(&self) -> String;

    /// Run the reduction once; no-op afterwards
    fn compute(&mut self);

    /// Global scalar (NaN before `compute()` or when undefined)
    fn value(&self) -> f64;

    /// Per-user breakdown (at the maximum cutoff for ranked metrics;
    /// empty for the joint aggregate metrics)
    fn per_user(&self) -> &BTreeMap<UserId, f64>;

    fn user_value(&self, user: UserId) -> Option<f64> {
        self.per_user().get(&user).copied()
    }

    /// Configured cutoffs; empty for error metrics
    fn cutoffs(&self) -> &[usize] {
        &[]
    }

    /// Global value at one cutoff; NaN for metrics without cutoffs
    fn value_at(&self, _k: usize) -> f64 {
        f64::NAN
    }

    /// Per-(user, cutoff) value
    fn user_value_at(&self, _user: UserId, _k: usize) -> Option<f64> {
        None
    }
}

/// Closed enumeration of the known metric kinds.
///
/// Replaces by-name reflection: the configuration surface parses a
/// string into a `MetricKind` and `build_metric` maps it to a
/// constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Mae,
    Rmse,
    Precision,
    Recall,
    Ndcg,
    Map,
    Mrr,
    Epc,
    Efd,
    Eild,
    Epd,
    AggrDiv,
    GiniIndex,
}

impl std::str::FromStr for MetricKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mae" => Ok(MetricKind::Mae),
            "rmse" => Ok(MetricKind::Rmse),
            "precision" => Ok(MetricKind::Precision),
            "recall" => Ok(MetricKind::Recall),
            "ndcg" => Ok(MetricKind::Ndcg),
            "map" => Ok(MetricKind::Map),
            "mrr" => Ok(MetricKind::Mrr),
            "epc" => Ok(MetricKind::Epc),
            "efd" => Ok(MetricKind::Efd),
            "eild" => Ok(MetricKind::Eild),
            "epd" => Ok(MetricKind::Epd),
            "aggrdiv" | "aggr-div" => Ok(MetricKind::AggrDiv),
            "gini" | "gini-index" => Ok(MetricKind::GiniIndex),
            other => Err(anyhow!("Unknown metric: {}", other)),
        }
    }
}

/// Shared inputs the registry hands to metric constructors.
///
/// `training` and `distance` are only required by the novelty and
/// diversity families; requesting such a metric without them is a
/// configuration error surfaced immediately.
#[derive(Clone)]
pub struct MetricInputs {
    pub predictions: Arc<PreferenceStore>,
    pub test: Arc<PreferenceStore>,
    pub training: Option<Arc<IndexedPreferenceStore>>,
    pub distance: Option<Arc<dyn ItemDistance>>,
    pub threshold: f64,
    pub cutoffs: Vec<usize>,
    pub error_strategy: ErrorStrategy,
}

/// Build a metric from its kind and the shared inputs.
pub fn build_metric(kind: MetricKind, inputs: &MetricInputs) -> Result<Box<dyn EvaluationMetric>> {
    let training = || {
        inputs
            .training
            .clone()
            .ok_or_else(|| anyhow!("{:?} requires the training store", kind))
    };
    let distance = || {
        inputs
            .distance
            .clone()
            .ok_or_else(|| anyhow!("{:?} requires an item distance", kind))
    };

    Ok(match kind {
        MetricKind::Mae => Box::new(Mae::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.error_strategy,
        )),
        MetricKind::Rmse => Box::new(Rmse::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.error_strategy,
        )),
        MetricKind::Precision => Box::new(Precision::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.threshold,
            inputs.cutoffs.clone(),
        )),
        MetricKind::Recall => Box::new(Recall::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.threshold,
            inputs.cutoffs.clone(),
        )),
        MetricKind::Ndcg => Box::new(Ndcg::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.cutoffs.clone(),
        )),
        MetricKind::Map => Box::new(Map::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.threshold,
            inputs.cutoffs.clone(),
        )),
        MetricKind::Mrr => Box::new(Mrr::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.threshold,
            inputs.cutoffs.clone(),
        )),
        MetricKind::Epc => Box::new(Epc::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            training()?,
            inputs.cutoffs.clone(),
        )?),
        MetricKind::Efd => Box::new(Efd::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            training()?,
            inputs.cutoffs.clone(),
        )?),
        MetricKind::Eild => Box::new(Eild::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            distance()?,
            inputs.cutoffs.clone(),
        )),
        MetricKind::Epd => Box::new(Epd::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            training()?,
            distance()?,
            inputs.threshold,
            inputs.cutoffs.clone(),
        )?),
        MetricKind::AggrDiv => Box::new(AggrDiv::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.cutoffs.clone(),
        )),
        MetricKind::GiniIndex => Box::new(GiniIndex::new(
            inputs.predictions.clone(),
            inputs.test.clone(),
            inputs.cutoffs.clone(),
        )),
    })
}

/// Mean of the non-NaN values in a per-user table.
///
/// Users whose value is undefined contribute nothing, per the explicit
/// NaN policy; an all-NaN (or empty) table yields NaN.
pub(crate) fn mean_ignoring_nan(values: &BTreeMap<UserId, f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in values.values() {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
