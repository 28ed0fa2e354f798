// Re-export of the types a host needs to drive the engine.

pub use crate::engine::{
    AllotmentEngine, AllotmentOutcome, BuildReport, ParallelRunReport, PathEndpoint, PathResult,
};
pub use crate::error::Error;
pub use crate::geometry::haversine_metres;
pub use crate::loading::{overpass_query, BoundingBox, GraphDetail, MapPayload, MapSource};
pub use crate::model::{Category, Centre, RoadGraph, Student};
pub use crate::routing::{a_star, a_star_bidirectional, dijkstra_costs, dijkstra_with_parents};
pub use crate::spatial::SpatialIndex;
pub use crate::{OsmNodeId, Seconds};
