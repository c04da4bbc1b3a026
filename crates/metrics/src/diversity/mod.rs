//! Diversity metrics.
//!
//! - `Eild` / `Epd` measure dissimilarity through an `ItemDistance`
//!   function (intra-list, and against the user's training profile)
//! - `AggrDiv` / `GiniIndex` measure item-exposure spread jointly
//!   across all users' top-k lists

pub mod aggr_div;
pub mod distance;
pub mod eild;
pub mod epd;
pub mod gini;

pub use aggr_div::AggrDiv;
pub use distance::{ItemDistance, JaccardItemDistance, StoredItemDistance};
pub use eild::Eild;
pub use epd::Epd;
pub use gini::GiniIndex;
