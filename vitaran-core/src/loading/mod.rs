//! Map payload contract and road-graph construction.

mod builder;
mod config;
mod overpass;

pub use builder::{build_road_graph, simulated_grid_graph};
pub use config::{BoundingBox, GraphDetail};
pub use overpass::{overpass_query, MapElement, MapPayload, MapSource};
