//! Balanced 2-d k-d tree over graph vertices.

use geo::Point;
use petgraph::graph::NodeIndex;

use crate::geometry::haversine_metres;

/// Metres per degree of latitude, used to turn an axis offset into a
/// conservative lower bound for subtree pruning. Exact great-circle
/// distance is only computed at candidate vertices.
const METRES_PER_DEGREE: f64 = 111_000.0;

/// One indexed vertex: a graph node with its coordinates.
#[derive(Debug, Clone, Copy)]
pub struct KdPoint {
    pub node: NodeIndex,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy)]
struct KdEntry {
    point: KdPoint,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced 2-d tree, median-split on alternating latitude/longitude axes.
/// Entries live in an arena; construction sorts each slice in place, so
/// building is O(n log^2 n).
#[derive(Debug, Default)]
pub struct KdTree {
    arena: Vec<KdEntry>,
    root: Option<usize>,
}

impl KdTree {
    /// Build a tree from the given vertices. Returns `None` for an empty
    /// input.
    pub fn build(mut points: Vec<KdPoint>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut tree = KdTree {
            arena: Vec::with_capacity(points.len()),
            root: None,
        };
        tree.root = tree.build_recursive(&mut points, 0);
        Some(tree)
    }

    fn build_recursive(&mut self, points: &mut [KdPoint], depth: usize) -> Option<usize> {
        if points.is_empty() {
            return None;
        }
        let axis = depth % 2;
        points.sort_unstable_by(|a, b| {
            axis_key(a, axis)
                .total_cmp(&axis_key(b, axis))
                .then_with(|| a.node.cmp(&b.node))
        });

        let median = points.len() / 2;
        let (left, rest) = points.split_at_mut(median);
        let (entry, right) = rest.split_at_mut(1);

        let slot = self.arena.len();
        self.arena.push(KdEntry {
            point: entry[0],
            axis,
            left: None,
            right: None,
        });
        let left_child = self.build_recursive(left, depth + 1);
        let right_child = self.build_recursive(right, depth + 1);
        self.arena[slot].left = left_child;
        self.arena[slot].right = right_child;
        Some(slot)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Vertex nearest to (lat, lon) by great-circle distance.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<NodeIndex> {
        let root = self.root?;
        let mut best: Option<(f64, NodeIndex)> = None;
        self.nearest_recursive(root, lat, lon, &mut best);
        best.map(|(_, node)| node)
    }

    fn nearest_recursive(
        &self,
        slot: usize,
        lat: f64,
        lon: f64,
        best: &mut Option<(f64, NodeIndex)>,
    ) {
        let entry = self.arena[slot];
        let distance = haversine_metres(
            Point::new(lon, lat),
            Point::new(entry.point.lon, entry.point.lat),
        );
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            *best = Some((distance, entry.point.node));
        }

        let diff = if entry.axis == 0 {
            lat - entry.point.lat
        } else {
            lon - entry.point.lon
        };
        let (near_side, far_side) = if diff < 0.0 {
            (entry.left, entry.right)
        } else {
            (entry.right, entry.left)
        };

        if let Some(near) = near_side {
            self.nearest_recursive(near, lat, lon, best);
        }

        // Only cross the splitting plane when it could hide something
        // closer than the best candidate so far.
        let axis_metres = diff.abs() * METRES_PER_DEGREE;
        if let Some(far) = far_side {
            if best.is_none_or(|(best_distance, _)| axis_metres < best_distance) {
                self.nearest_recursive(far, lat, lon, best);
            }
        }
    }
}

fn axis_key(point: &KdPoint, axis: usize) -> f64 {
    if axis == 0 {
        point.lat
    } else {
        point.lon
    }
}
