//! Spatial lookup over graph vertices: k-d tree nearest-vertex queries and
//! component-aware snapping.

mod index;
mod kdtree;

pub use index::SpatialIndex;
pub use kdtree::{KdPoint, KdTree};
