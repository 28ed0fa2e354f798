//! Unidirectional A* with a drive-time admissible heuristic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;

use crate::geometry::haversine_metres;
use crate::model::RoadGraph;
use crate::Seconds;

/// Fastest edge speed on the network, metres per second (about 100 km/h).
/// Dividing the crow-flies distance by it keeps the heuristic admissible.
pub const MAX_SPEED_MPS: f64 = 27.8;

/// Lower bound on the drive time between two vertices.
pub(crate) fn heuristic(graph: &RoadGraph, from: NodeIndex, to: NodeIndex) -> Seconds {
    haversine_metres(graph.point(from), graph.point(to)) / MAX_SPEED_MPS
}

#[derive(Copy, Clone, PartialEq)]
pub(super) struct SearchState {
    pub(super) f_score: Seconds,
    pub(super) node: NodeIndex,
}

impl Eq for SearchState {}

// Min-heap by f-score, ties broken by node index.
impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* from `start` to `goal`.
///
/// The open heap is keyed by `g + h`; a membership set prevents duplicate
/// enqueues of a vertex, and expansion always reads the live g-score, so
/// relaxations that arrive while a vertex is queued still take effect.
/// Returns the vertex path, or an empty vector when the goal is
/// unreachable.
pub fn a_star(graph: &RoadGraph, start: NodeIndex, goal: NodeIndex) -> Vec<NodeIndex> {
    if start == goal {
        return vec![start];
    }

    let mut g_score: HashMap<NodeIndex, Seconds> = HashMap::new();
    let mut came_from: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut open = BinaryHeap::new();
    let mut queued: HashSet<NodeIndex> = HashSet::new();

    g_score.insert(start, 0.0);
    open.push(SearchState {
        f_score: heuristic(graph, start, goal),
        node: start,
    });
    queued.insert(start);

    while let Some(SearchState { node: current, .. }) = open.pop() {
        queued.remove(&current);

        if current == goal {
            return reconstruct(&came_from, start, goal);
        }

        let current_g = g_score.get(&current).copied().unwrap_or(Seconds::INFINITY);
        for (neighbour, seconds) in graph.edges(current) {
            let tentative = current_g + seconds;
            let known = g_score.get(&neighbour).copied().unwrap_or(Seconds::INFINITY);
            if tentative < known {
                came_from.insert(neighbour, current);
                g_score.insert(neighbour, tentative);
                if queued.insert(neighbour) {
                    open.push(SearchState {
                        f_score: tentative + heuristic(graph, neighbour, goal),
                        node: neighbour,
                    });
                }
            }
        }
    }

    Vec::new()
}

fn reconstruct(
    came_from: &HashMap<NodeIndex, NodeIndex>,
    start: NodeIndex,
    goal: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = Vec::new();
    let mut node = goal;
    while let Some(&previous) = came_from.get(&node) {
        path.push(node);
        node = previous;
    }
    path.push(start);
    path.reverse();
    path
}
