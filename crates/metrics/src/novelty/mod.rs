//! Novelty metrics.
//!
//! Both metrics weight an item by a monotonically decreasing function
//! of its training popularity, read from the frozen training store:
//! an item's popularity is the fraction of training users that rated
//! it.

pub mod efd;
pub mod epc;

pub use efd::Efd;
pub use epc::Epc;
