use std::collections::BinaryHeap;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use super::state::State;
use crate::model::RoadGraph;
use crate::Seconds;

/// Dijkstra with predecessor tracking, for callers that need the shortest
/// path tree as well as the costs. The source is its own parent; every
/// other reached vertex maps to the vertex it was relaxed from.
pub fn dijkstra_with_parents(
    graph: &RoadGraph,
    start: NodeIndex,
) -> (HashMap<NodeIndex, Seconds>, HashMap<NodeIndex, NodeIndex>) {
    let mut distances: HashMap<NodeIndex, Seconds> = HashMap::new();
    let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(start, 0.0);
    parents.insert(start, start);
    heap.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        for (next, seconds) in graph.edges(node) {
            let next_cost = cost + seconds;
            match distances.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    parents.insert(next, node);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        parents.insert(next, node);
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    (distances, parents)
}
