//! Weighted directed road graph with component labels.

use geo::Point;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::{OsmNodeId, Seconds};

/// Component label for a vertex the flood fill has not reached.
pub const COMPONENT_UNSEEN: i32 = 0;
/// Component label for a vertex with no outgoing edges.
pub const COMPONENT_ISOLATED: i32 = -1;

/// Road graph vertex.
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// OSM id of the node.
    pub id: OsmNodeId,
    /// Node coordinates (x = lon, y = lat).
    pub geometry: Point<f64>,
}

/// Directed road segment with a drive-time weight.
#[derive(Debug, Clone, Copy)]
pub struct RoadEdge {
    /// Drive time in seconds.
    pub seconds: Seconds,
}

/// Directed road graph keyed by external OSM node ids.
///
/// Vertices carry their coordinates; edges carry drive time in seconds.
/// After construction, [`compute_components`](Self::compute_components)
/// labels every vertex with the out-edge flood-fill component it belongs
/// to, which snapping uses to avoid disconnected islands.
#[derive(Debug, Default, Clone)]
pub struct RoadGraph {
    pub graph: DiGraph<RoadNode, RoadEdge>,
    node_map: HashMap<OsmNodeId, NodeIndex>,
    components: Vec<i32>,
    main_component: Option<i32>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Insert a vertex, or update its coordinates when the id is already
    /// known (later map records win, as with repeated Overpass elements).
    pub fn upsert_node(&mut self, id: OsmNodeId, lat: f64, lon: f64) -> NodeIndex {
        match self.node_map.entry(id) {
            Entry::Occupied(entry) => {
                let idx = *entry.get();
                self.graph[idx].geometry = Point::new(lon, lat);
                idx
            }
            Entry::Vacant(entry) => {
                let idx = self.graph.add_node(RoadNode {
                    id,
                    geometry: Point::new(lon, lat),
                });
                entry.insert(idx);
                idx
            }
        }
    }

    /// Add a directed edge between two known vertices. Unknown endpoints,
    /// self-loops and non-positive or non-finite costs are rejected.
    pub fn add_edge_by_id(&mut self, from: OsmNodeId, to: OsmNodeId, seconds: Seconds) -> bool {
        let (Some(&u), Some(&v)) = (self.node_map.get(&from), self.node_map.get(&to)) else {
            return false;
        };
        if u == v || !seconds.is_finite() || seconds <= 0.0 {
            debug!("skipping degenerate edge {from} -> {to} ({seconds} s)");
            return false;
        }
        self.graph.add_edge(u, v, RoadEdge { seconds });
        true
    }

    pub fn index_of(&self, id: OsmNodeId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        node.index() < self.graph.node_count()
    }

    pub fn osm_id(&self, node: NodeIndex) -> OsmNodeId {
        self.graph[node].id
    }

    pub fn point(&self, node: NodeIndex) -> Point<f64> {
        self.graph[node].geometry
    }

    /// Outgoing edges of `node` as `(neighbour, seconds)` pairs.
    pub fn edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, Seconds)> + '_ {
        self.graph
            .edges(node)
            .map(|edge| (edge.target(), edge.weight().seconds))
    }

    pub fn out_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges(node).count()
    }

    /// Vertices with at least one outgoing edge, in index order.
    pub fn connected_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&n| self.out_degree(n) > 0)
    }

    /// Cheapest direct edge weight from `from` to `to`, if any edge exists.
    /// Parallel edges are permitted; the minimum wins.
    pub fn min_edge_seconds(&self, from: NodeIndex, to: NodeIndex) -> Option<Seconds> {
        self.graph
            .edges_connecting(from, to)
            .map(|edge| edge.weight().seconds)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Label connected components by iterative depth-first flood fill over
    /// outgoing edges. Vertices with no outgoing edges that the fill never
    /// reaches are marked isolated; positive ids are assigned in increasing
    /// order of first discovery. Also determines the main component (the
    /// largest one, ties broken by the lowest id).
    pub fn compute_components(&mut self) {
        let n = self.graph.node_count();
        self.components = vec![COMPONENT_UNSEEN; n];
        let mut next_id = 0;
        let mut stack = Vec::new();

        for start in self.graph.node_indices() {
            if self.components[start.index()] != COMPONENT_UNSEEN {
                continue;
            }
            if self.out_degree(start) == 0 {
                self.components[start.index()] = COMPONENT_ISOLATED;
                continue;
            }
            next_id += 1;
            self.components[start.index()] = next_id;
            stack.push(start);
            while let Some(current) = stack.pop() {
                for edge in self.graph.edges(current) {
                    let neighbour = edge.target();
                    if self.components[neighbour.index()] == COMPONENT_UNSEEN {
                        self.components[neighbour.index()] = next_id;
                        stack.push(neighbour);
                    }
                }
            }
        }

        let mut counts: HashMap<i32, usize> = HashMap::new();
        for &component in &self.components {
            if component > 0 {
                *counts.entry(component).or_insert(0) += 1;
            }
        }
        self.main_component = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(id, _)| id);

        debug!("labelled {next_id} components over {n} vertices");
    }

    /// Component label of `node`; `COMPONENT_UNSEEN` before labelling.
    pub fn component(&self, node: NodeIndex) -> i32 {
        self.components
            .get(node.index())
            .copied()
            .unwrap_or(COMPONENT_UNSEEN)
    }

    /// Id of the largest component, if any vertex has outgoing edges.
    pub fn main_component(&self) -> Option<i32> {
        self.main_component
    }

    pub fn in_main_component(&self, node: NodeIndex) -> bool {
        match self.main_component {
            Some(main) => self.component(node) == main,
            None => false,
        }
    }
}
