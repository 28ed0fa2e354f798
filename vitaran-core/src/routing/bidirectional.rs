//! Bidirectional A* for point-to-point queries.

use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use log::warn;
use petgraph::graph::NodeIndex;

use super::astar::{heuristic, SearchState};
use crate::model::RoadGraph;
use crate::Seconds;

/// Hard cap on interleaved expansions; a search that exceeds it is
/// abandoned and reported as no-path.
pub const MAX_ITERATIONS: usize = 100_000;

/// Bidirectional A* between `start` and `goal`.
///
/// One forward and one backward expansion per iteration, each side with
/// its own open heap, g-score map and closed set. The first vertex closed
/// by both sides becomes the meeting point; the final path is the forward
/// path to the meeting point followed by the backward path from it. The
/// meeting rule is a heuristic cutoff rather than an optimality proof, so
/// the result can be marginally longer than the true optimum.
pub fn a_star_bidirectional(
    graph: &RoadGraph,
    start: NodeIndex,
    goal: NodeIndex,
) -> Vec<NodeIndex> {
    if start == goal {
        return vec![start];
    }
    if graph.out_degree(start) == 0 || graph.out_degree(goal) == 0 {
        warn!("bidirectional query endpoint has no outgoing edges");
        return Vec::new();
    }

    let mut g_forward: HashMap<NodeIndex, Seconds> = HashMap::new();
    let mut g_backward: HashMap<NodeIndex, Seconds> = HashMap::new();
    let mut came_forward: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut came_backward: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut open_forward = BinaryHeap::new();
    let mut open_backward = BinaryHeap::new();
    let mut closed_forward: HashSet<NodeIndex> = HashSet::new();
    let mut closed_backward: HashSet<NodeIndex> = HashSet::new();

    g_forward.insert(start, 0.0);
    g_backward.insert(goal, 0.0);
    open_forward.push(SearchState {
        f_score: heuristic(graph, start, goal),
        node: start,
    });
    open_backward.push(SearchState {
        f_score: heuristic(graph, goal, start),
        node: goal,
    });

    let mut meeting_point = None;
    let mut iterations = 0;

    'search: while !open_forward.is_empty() && !open_backward.is_empty() {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            warn!("bidirectional search abandoned after {MAX_ITERATIONS} iterations");
            break;
        }

        if let Some(SearchState { node: current, .. }) = open_forward.pop() {
            if !closed_forward.insert(current) {
                continue 'search;
            }
            if closed_backward.contains(&current) {
                meeting_point = Some(current);
                break;
            }
            let current_g = g_forward.get(&current).copied().unwrap_or(Seconds::INFINITY);
            for (neighbour, seconds) in graph.edges(current) {
                let tentative = current_g + seconds;
                if tentative < g_forward.get(&neighbour).copied().unwrap_or(Seconds::INFINITY) {
                    g_forward.insert(neighbour, tentative);
                    came_forward.insert(neighbour, current);
                    open_forward.push(SearchState {
                        f_score: tentative + heuristic(graph, neighbour, goal),
                        node: neighbour,
                    });
                }
            }
        }

        if let Some(SearchState { node: current, .. }) = open_backward.pop() {
            if !closed_backward.insert(current) {
                continue 'search;
            }
            if closed_forward.contains(&current) {
                meeting_point = Some(current);
                break;
            }
            let current_g = g_backward.get(&current).copied().unwrap_or(Seconds::INFINITY);
            for (neighbour, seconds) in graph.edges(current) {
                let tentative = current_g + seconds;
                if tentative < g_backward.get(&neighbour).copied().unwrap_or(Seconds::INFINITY) {
                    g_backward.insert(neighbour, tentative);
                    came_backward.insert(neighbour, current);
                    open_backward.push(SearchState {
                        f_score: tentative + heuristic(graph, neighbour, start),
                        node: neighbour,
                    });
                }
            }
        }
    }

    let Some(meeting) = meeting_point else {
        return Vec::new();
    };

    // Forward half: walk parents back to the start, then flip.
    let mut path = Vec::new();
    let mut node = meeting;
    while let Some(&previous) = came_forward.get(&node) {
        path.push(node);
        node = previous;
    }
    path.push(start);
    path.reverse();

    // Backward half: the parent chain already runs towards the goal; skip
    // the meeting vertex itself, it is the last entry of the forward half.
    let mut node = meeting;
    while let Some(&next) = came_backward.get(&node) {
        path.push(next);
        node = next;
    }

    path
}
