use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

use crate::Seconds;

#[derive(Copy, Clone, PartialEq)]
pub(super) struct State {
    pub(super) cost: Seconds,
    pub(super) node: NodeIndex,
}

impl Eq for State {}

// Min-heap by cost (reversed from standard Rust BinaryHeap); the node
// index breaks ties so pop order is total.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
