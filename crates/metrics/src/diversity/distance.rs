//! Item-to-item distance functions.

use pref_store::ItemId;
use std::collections::{BTreeMap, BTreeSet};

/// Symmetric item distance, zero on identical items.
///
/// `None` means the distance is unknown for the pair (e.g. an item
/// without features); callers skip unknown pairs rather than invent a
/// default.
pub trait ItemDistance: Send + Sync {
    fn distance(&self, a: ItemId, b: ItemId) -> Option<f64>;
}

/// Jaccard distance over per-item feature sets (e.g. genre tags).
pub struct JaccardItemDistance {
    features: BTreeMap<ItemId, BTreeSet<String>>,
}

impl JaccardItemDistance {
    pub fn new(features: BTreeMap<ItemId, BTreeSet<String>>) -> Self {
        Self { features }
    }
}

impl ItemDistance for JaccardItemDistance {
    fn distance(&self, a: ItemId, b: ItemId) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }
        let fa = self.features.get(&a)?;
        let fb = self.features.get(&b)?;
        let union = fa.union(fb).count();
        if union == 0 {
            return Some(0.0);
        }
        let intersection = fa.intersection(fb).count();
        Some(1.0 - intersection as f64 / union as f64)
    }
}

/// Dense precomputed distance table for O(1) repeated access.
///
/// Keys are stored order-normalised, so lookups are symmetric.
pub struct StoredItemDistance {
    table: BTreeMap<(ItemId, ItemId), f64>,
}

impl StoredItemDistance {
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Record a symmetric distance for the pair
    pub fn insert(&mut self, a: ItemId, b: ItemId, distance: f64) {
        self.table.insert(Self::key(a, b), distance);
    }

    /// Evaluate `inner` over every unordered pair of `items` once.
    pub fn precompute(items: &BTreeSet<ItemId>, inner: &dyn ItemDistance) -> Self {
        let mut stored = Self::new();
        let items: Vec<ItemId> = items.iter().copied().collect();
        for (idx, &a) in items.iter().enumerate() {
            for &b in &items[idx + 1..] {
                if let Some(d) = inner.distance(a, b) {
                    stored.insert(a, b, d);
                }
            }
        }
        stored
    }

    fn key(a: ItemId, b: ItemId) -> (ItemId, ItemId) {
        if a <= b { (a, b) } else { (b, a) }
    }
}

impl Default for StoredItemDistance {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemDistance for StoredItemDistance {
    fn distance(&self, a: ItemId, b: ItemId) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }
        self.table.get(&Self::key(a, b)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_fixture() -> JaccardItemDistance {
        let mut features = BTreeMap::new();
        features.insert(1, BTreeSet::from(["action".to_string(), "scifi".to_string()]));
        features.insert(2, BTreeSet::from(["action".to_string(), "drama".to_string()]));
        features.insert(3, BTreeSet::from(["romance".to_string()]));
        JaccardItemDistance::new(features)
    }

    #[test]
    fn test_jaccard_values() {
        let distance = feature_fixture();
        // |{action}| / |{action,scifi,drama}| = 1/3 similarity
        assert!((distance.distance(1, 2).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(distance.distance(1, 3), Some(1.0));
        assert_eq!(distance.distance(1, 1), Some(0.0));
        assert_eq!(distance.distance(1, 99), None);
    }

    #[test]
    fn test_jaccard_symmetry() {
        let distance = feature_fixture();
        assert_eq!(distance.distance(1, 2), distance.distance(2, 1));
    }

    #[test]
    fn test_stored_lookup_is_symmetric() {
        let inner = feature_fixture();
        let items = BTreeSet::from([1, 2, 3]);
        let stored = StoredItemDistance::precompute(&items, &inner);

        assert_eq!(stored.distance(2, 1), inner.distance(1, 2));
        assert_eq!(stored.distance(3, 1), Some(1.0));
        assert_eq!(stored.distance(2, 2), Some(0.0));
        assert_eq!(stored.distance(1, 99), None);
    }
}
