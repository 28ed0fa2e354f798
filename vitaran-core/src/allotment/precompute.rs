//! One Dijkstra per centre, and the vertex-to-centre lookup table the
//! matcher consumes.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use hashbrown::HashMap;
use log::{info, warn};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use crate::model::{Centre, RoadGraph};
use crate::routing::{dijkstra_costs, dijkstra_with_parents};
use crate::{Error, OsmNodeId, Seconds};

/// Result of one single-source run from a centre's snapped vertex.
///
/// A failed run (centre never snapped, stale vertex) is recorded here and
/// never aborts the batch.
#[derive(Debug, Clone, Default)]
pub struct CentreSearchResult {
    pub centre_id: String,
    pub start_node: Option<OsmNodeId>,
    pub distances: HashMap<NodeIndex, Seconds>,
    pub parents: HashMap<NodeIndex, NodeIndex>,
    pub computation_time_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl CentreSearchResult {
    fn failed(centre: &Centre, message: impl Into<String>) -> Self {
        Self {
            centre_id: centre.centre_id.clone(),
            start_node: centre.snapped_node_id,
            success: false,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of vertices the search reached.
    pub fn reachable_count(&self) -> usize {
        self.distances.len()
    }
}

/// Run the traced Dijkstra for one centre, capturing failure on the result
/// instead of propagating it.
pub fn run_centre_search(graph: &RoadGraph, centre: &Centre) -> CentreSearchResult {
    let Some(osm_id) = centre.snapped_node_id else {
        return CentreSearchResult::failed(centre, "centre has no snapped vertex");
    };
    let Some(start) = graph.index_of(osm_id) else {
        return CentreSearchResult::failed(
            centre,
            format!("snapped vertex {osm_id} is not in the graph"),
        );
    };

    let begun = Instant::now();
    let (distances, parents) = dijkstra_with_parents(graph, start);
    let computation_time_ms = begun.elapsed().as_millis() as u64;

    info!(
        "single-source search from centre {} reached {} vertices in {} ms",
        centre.centre_id,
        distances.len(),
        computation_time_ms
    );

    CentreSearchResult {
        centre_id: centre.centre_id.clone(),
        start_node: Some(osm_id),
        distances,
        parents,
        computation_time_ms,
        success: true,
        error_message: None,
    }
}

/// One traced search per centre, rayon-parallel, joined in centre order.
pub fn run_all_centre_searches(graph: &RoadGraph, centres: &[Centre]) -> Vec<CentreSearchResult> {
    centres
        .par_iter()
        .map(|centre| run_centre_search(graph, centre))
        .collect()
}

/// Vertex-to-centre drive times. The inner row is indexed by centre
/// position; entries a centre's search never reached stay at infinity and
/// read back as unreachable.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    rows: HashMap<NodeIndex, Vec<Seconds>>,
    centre_count: usize,
}

impl DistanceTable {
    pub fn new(centre_count: usize) -> Self {
        Self {
            rows: HashMap::new(),
            centre_count,
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn centre_count(&self) -> usize {
        self.centre_count
    }

    /// Number of vertices reached by at least one centre.
    pub fn vertex_count(&self) -> usize {
        self.rows.len()
    }

    fn set(&mut self, node: NodeIndex, centre: usize, seconds: Seconds) {
        let row = self
            .rows
            .entry(node)
            .or_insert_with(|| vec![Seconds::INFINITY; self.centre_count]);
        row[centre] = seconds;
    }

    /// Drive time from the centre at `centre` to `node`, if reachable.
    pub fn get(&self, node: NodeIndex, centre: usize) -> Option<Seconds> {
        self.rows
            .get(&node)?
            .get(centre)
            .copied()
            .filter(|seconds| seconds.is_finite())
    }

    /// Full per-centre row for a vertex; infinite entries are unreachable.
    pub fn row(&self, node: NodeIndex) -> Option<&[Seconds]> {
        self.rows.get(&node).map(Vec::as_slice)
    }
}

/// Precompute the lookup table: one plain Dijkstra per centre run in
/// parallel, then a sequential pivot in centre order.
pub fn build_distance_table(graph: &RoadGraph, centres: &[Centre]) -> DistanceTable {
    let searches: Vec<HashMap<NodeIndex, Seconds>> = centres
        .par_iter()
        .map(|centre| {
            match centre.snapped_node_id.and_then(|id| graph.index_of(id)) {
                Some(start) => dijkstra_costs(graph, start),
                None => {
                    warn!(
                        "centre {} has no usable snapped vertex, leaving its column empty",
                        centre.centre_id
                    );
                    HashMap::new()
                }
            }
        })
        .collect();

    let mut table = DistanceTable::new(centres.len());
    for (centre_idx, distances) in searches.into_iter().enumerate() {
        for (node, seconds) in distances {
            table.set(node, centre_idx, seconds);
        }
    }

    info!(
        "allotment lookup table covers {} vertices across {} centres",
        table.vertex_count(),
        table.centre_count()
    );
    table
}

/// Persist one centre search as the twin JSON documents the host asks for:
/// `{vertex -> seconds}` for reached vertices and `{vertex -> parent}` for
/// non-roots. Keys are stringified vertex ids; map order is fixed so dumps
/// are reproducible.
pub fn save_centre_search(
    result: &CentreSearchResult,
    graph: &RoadGraph,
    distances_file: &Path,
    parents_file: &Path,
) -> Result<(), Error> {
    let mut distances: BTreeMap<String, Seconds> = BTreeMap::new();
    for (&node, &seconds) in &result.distances {
        distances.insert(graph.osm_id(node).to_string(), seconds);
    }
    std::fs::write(distances_file, serde_json::to_string_pretty(&distances)?)?;

    let mut parents: BTreeMap<String, OsmNodeId> = BTreeMap::new();
    for (&node, &parent) in &result.parents {
        if node != parent {
            parents.insert(graph.osm_id(node).to_string(), graph.osm_id(parent));
        }
    }
    std::fs::write(parents_file, serde_json::to_string_pretty(&parents)?)?;

    info!(
        "saved search results for centre {} to {} and {}",
        result.centre_id,
        distances_file.display(),
        parents_file.display()
    );
    Ok(())
}
