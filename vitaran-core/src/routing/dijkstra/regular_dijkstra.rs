use std::collections::BinaryHeap;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use super::state::State;
use crate::model::RoadGraph;
use crate::Seconds;

/// Dijkstra's algorithm over the road graph.
///
/// Returns the drive time in seconds for every vertex reachable from
/// `start`; vertices absent from the map are unreachable.
pub fn dijkstra_costs(graph: &RoadGraph, start: NodeIndex) -> HashMap<NodeIndex, Seconds> {
    let mut distances: HashMap<NodeIndex, Seconds> = HashMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(start, 0.0);
    heap.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        // Skip stale entries superseded by a cheaper relaxation.
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
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> RoadGraph {
        let mut g = RoadGraph::new();
        for id in 1..=4 {
            g.upsert_node(id, 0.0, id as f64 * 0.01);
        }
        g.add_edge_by_id(1, 2, 10.0);
        g.add_edge_by_id(1, 3, 2.0);
        g.add_edge_by_id(3, 2, 3.0);
        g.add_edge_by_id(2, 4, 1.0);
        g.compute_components();
        g
    }

    #[test]
    fn takes_the_cheaper_route() {
        let g = diamond();
        let costs = dijkstra_costs(&g, g.index_of(1).unwrap());
        assert_eq!(costs[&g.index_of(1).unwrap()], 0.0);
        assert_eq!(costs[&g.index_of(2).unwrap()], 5.0);
        assert_eq!(costs[&g.index_of(3).unwrap()], 2.0);
        assert_eq!(costs[&g.index_of(4).unwrap()], 6.0);
    }

    #[test]
    fn unreached_vertices_are_absent() {
        let mut g = diamond();
        g.upsert_node(9, 5.0, 5.0);
        g.upsert_node(10, 5.0, 5.01);
        g.add_edge_by_id(9, 10, 1.0);
        g.compute_components();
        let costs = dijkstra_costs(&g, g.index_of(1).unwrap());
        assert!(!costs.contains_key(&g.index_of(9).unwrap()));
        assert!(!costs.contains_key(&g.index_of(10).unwrap()));
    }
}
