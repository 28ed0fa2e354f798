//! Path post-processing before results are handed to clients.

use log::warn;
use petgraph::graph::NodeIndex;

use crate::model::RoadGraph;
use crate::Seconds;

/// Drop vertices that are missing from the graph or have no outgoing
/// edges, preserving the order of the rest.
pub fn clean_path(graph: &RoadGraph, path: &[NodeIndex]) -> Vec<NodeIndex> {
    let mut cleaned = Vec::with_capacity(path.len());
    for &node in path {
        if !graph.contains(node) {
            warn!("path contains unknown vertex index {}", node.index());
            continue;
        }
        if graph.out_degree(node) == 0 {
            warn!("path contains disconnected vertex {}", graph.osm_id(node));
            continue;
        }
        cleaned.push(node);
    }
    cleaned
}

/// Total drive time along the consecutive edges of a path, in seconds.
/// Parallel edges contribute their cheapest weight; consecutive vertices
/// without a direct edge contribute nothing.
pub fn path_seconds(graph: &RoadGraph, path: &[NodeIndex]) -> Seconds {
    path.windows(2)
        .filter_map(|pair| graph.min_edge_seconds(pair[0], pair[1]))
        .sum()
}
