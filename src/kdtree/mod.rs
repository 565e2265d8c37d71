//! An implementation of a mutable, self-rebalancing K-D Tree.
//!
//! Unlike the static indexes built in one pass over a known set of items, this tree accepts
//! insertions, updates and deletions at any time. Deletions replace a removed node with its
//! successor on the split axis, and the tree is periodically rebuilt around per-level medians to
//! undo the drift that accumulates from those edits.

#![warn(missing_docs)]

mod builder;
mod index;
mod region;
mod r#trait;
mod traversal;

pub use builder::KDTreeBuilder;
pub use index::KDTree;
pub use r#trait::KDTreeIndex;
pub use region::{BoundingBox, RectRegion, Region};
pub use traversal::Node;
