//! Core engine for assigning students to examination centres over a real
//! road network.
//!
//! The pipeline: a map payload (Overpass JSON) is turned into a weighted
//! directed road graph with drive-time edges, a k-d tree snaps free
//! coordinates to routable vertices, one Dijkstra per centre precomputes a
//! vertex-to-centre travel-time table, and a tiered greedy matcher consumes
//! that table under per-centre capacities. [`AllotmentEngine`] owns the
//! whole lifecycle; ad-hoc point-to-point queries run A* on the same graph.

pub mod allotment;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod spatial;

pub use engine::AllotmentEngine;
pub use error::Error;

/// External OpenStreetMap node identifier. Assigned by the map provider and
/// treated as an opaque key.
pub type OsmNodeId = i64;

/// Travel time in seconds.
pub type Seconds = f64;
