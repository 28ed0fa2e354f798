//! Nearest-vertex snapping over the road graph.

use geo::Point;
use log::info;
use petgraph::graph::NodeIndex;

use super::kdtree::{KdPoint, KdTree};
use crate::geometry::haversine_metres;
use crate::model::RoadGraph;

/// Snapping queries over the routable part of the graph.
///
/// The index covers every vertex with at least one outgoing edge. A plain
/// nearest lookup goes through the k-d tree; the component-aware variants
/// fall back to linear scans, which is acceptable because they only run
/// for points that snapped onto a disconnected island.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: Option<KdTree>,
}

impl SpatialIndex {
    /// Build the index over every vertex that has outgoing edges.
    pub fn build(graph: &RoadGraph) -> Self {
        let points: Vec<KdPoint> = graph
            .connected_nodes()
            .map(|node| {
                let p = graph.point(node);
                KdPoint {
                    node,
                    lat: p.y(),
                    lon: p.x(),
                }
            })
            .collect();
        info!("spatial index built over {} routable vertices", points.len());
        Self {
            tree: KdTree::build(points),
        }
    }

    /// Nearest routable vertex, or `None` when the graph has no edges.
    pub fn nearest(&self, graph: &RoadGraph, lat: f64, lon: f64) -> Option<NodeIndex> {
        if let Some(tree) = &self.tree {
            if let Some(hit) = tree.nearest(lat, lon) {
                return Some(hit);
            }
        }
        self.scan_nearest(graph, lat, lon, |_| true)
    }

    /// Up to `k` nearest routable vertices, closest first, ties broken by
    /// vertex order so results are deterministic. Partial selection keeps
    /// this O(n) for k much smaller than n.
    pub fn k_nearest(
        &self,
        graph: &RoadGraph,
        lat: f64,
        lon: f64,
        k: usize,
    ) -> Vec<NodeIndex> {
        if k == 0 {
            return Vec::new();
        }
        let query = Point::new(lon, lat);
        let mut distances: Vec<(f64, NodeIndex)> = graph
            .connected_nodes()
            .map(|node| (haversine_metres(query, graph.point(node)), node))
            .collect();
        if distances.is_empty() {
            return Vec::new();
        }

        let k = k.min(distances.len());
        let ordering =
            |a: &(f64, NodeIndex), b: &(f64, NodeIndex)| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1));
        if k < distances.len() {
            distances.select_nth_unstable_by(k - 1, ordering);
            distances.truncate(k);
        }
        distances.sort_unstable_by(ordering);
        distances.into_iter().map(|(_, node)| node).collect()
    }

    /// Nearest vertex restricted to the main component. Falls back to the
    /// unrestricted nearest when no main component exists.
    pub fn nearest_in_main_component(
        &self,
        graph: &RoadGraph,
        lat: f64,
        lon: f64,
    ) -> Option<NodeIndex> {
        if graph.main_component().is_none() {
            return self.nearest(graph, lat, lon);
        }
        self.scan_nearest(graph, lat, lon, |node| graph.in_main_component(node))
    }

    /// Snap a free coordinate to a routable vertex, replacing hits on
    /// disconnected islands with the nearest main-component vertex.
    /// Returns `None` only when no vertex has any outgoing edges.
    pub fn snap(&self, graph: &RoadGraph, lat: f64, lon: f64) -> Option<NodeIndex> {
        let hit = self.nearest(graph, lat, lon)?;
        if graph.in_main_component(hit) {
            return Some(hit);
        }
        self.nearest_in_main_component(graph, lat, lon).or(Some(hit))
    }

    fn scan_nearest<F>(&self, graph: &RoadGraph, lat: f64, lon: f64, keep: F) -> Option<NodeIndex>
    where
        F: Fn(NodeIndex) -> bool,
    {
        let query = Point::new(lon, lat);
        graph
            .connected_nodes()
            .filter(|&node| keep(node))
            .map(|node| (haversine_metres(query, graph.point(node)), node))
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, node)| node)
    }
}
