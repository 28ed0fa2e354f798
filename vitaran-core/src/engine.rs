//! Engine facade: owns the graph, the spatial index, the centres and the
//! precomputed table, and exposes the host-facing operations.
//!
//! The required lifecycle order (build the graph, snap the centres,
//! precompute the table, then snap students / allot / answer path queries
//! in any mix) is enforced by the engine value itself: everything before
//! the first successful [`build`](AllotmentEngine::build) refuses with
//! [`Error::GraphNotReady`], and a later build replaces all derived state
//! in one step.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use hashbrown::HashMap;
use log::{info, warn};
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::allotment::{
    build_distance_table, collect_diagnostics, run_all_centre_searches, run_tiered_allotment,
    save_centre_search, CentreSearchResult, DiagnosticsReport, DistanceTable,
};
use crate::loading::{
    build_road_graph, simulated_grid_graph, BoundingBox, GraphDetail, MapPayload, MapSource,
};
use crate::model::{Centre, RoadGraph, Student};
use crate::routing::{a_star, a_star_bidirectional, clean_path, path_seconds};
use crate::spatial::SpatialIndex;
use crate::{Error, OsmNodeId, Seconds};

/// Snap candidates considered per endpoint for a coordinate path query.
const PATH_CANDIDATES: usize = 5;

/// Per-phase build timings, milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BuildTimings {
    pub fetch_ms: u64,
    pub graph_ms: u64,
    pub index_ms: u64,
    pub precompute_ms: u64,
    pub total_ms: u64,
}

/// What a build produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub vertex_count: usize,
    pub edge_count: usize,
    /// True when the map payload was empty and the simulated grid was used.
    pub used_fallback: bool,
    pub centres_snapped: usize,
    pub timings: BuildTimings,
}

/// Per-phase allotment timings, milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AllotmentTimings {
    pub snap_ms: u64,
    pub matching_ms: u64,
    pub total_ms: u64,
}

/// Outcome of one allotment run.
#[derive(Debug, Clone, Serialize)]
pub struct AllotmentOutcome {
    /// student id -> centre id for every student that got a seat.
    pub assignments: HashMap<String, String>,
    /// Per student, the drive seconds to each reachable centre.
    pub debug_distances: HashMap<String, BTreeMap<String, Seconds>>,
    /// Students that no reachable centre could take.
    pub unassigned: Vec<String>,
    pub timings: AllotmentTimings,
}

/// Path query endpoint: an exact vertex or a free coordinate.
#[derive(Debug, Clone, Copy)]
pub enum PathEndpoint {
    Vertex(OsmNodeId),
    Coordinate { lat: f64, lon: f64 },
}

/// Result of a point-to-point query. An empty path carries the reason in
/// `failure` instead of being an error.
#[derive(Debug, Clone, Serialize)]
pub struct PathResult {
    pub vertices: Vec<OsmNodeId>,
    /// (lat, lon) per path vertex, ready for drawing.
    pub coordinates: Vec<(f64, f64)>,
    pub total_seconds: Seconds,
    pub failure: Option<String>,
}

impl PathResult {
    fn not_found(reason: impl Into<String>) -> Self {
        Self {
            vertices: Vec::new(),
            coordinates: Vec::new(),
            total_seconds: 0.0,
            failure: Some(reason.into()),
        }
    }
}

/// Batch report for the exposed per-centre precompute.
#[derive(Debug)]
pub struct ParallelRunReport {
    pub results: Vec<CentreSearchResult>,
    pub parallel_ms: u64,
    /// Mean per-centre time over the successful runs.
    pub avg_per_centre_ms: u64,
    /// What a sequential pass over every centre would have cost; failed
    /// centres are extrapolated at the average successful cost.
    pub estimated_sequential_ms: u64,
    /// Estimated sequential time over the parallel wall time, 0 when
    /// either side was too small to measure.
    pub speedup: f64,
}

impl ParallelRunReport {
    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.successful()
    }
}

/// The allotment engine. One value owns the whole pipeline state; separate
/// regions can simply use separate engines.
#[derive(Debug, Default)]
pub struct AllotmentEngine {
    graph: RoadGraph,
    index: SpatialIndex,
    centres: Vec<Centre>,
    students: Vec<Student>,
    table: DistanceTable,
    assignments: HashMap<String, String>,
    ready: bool,
}

impl AllotmentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn centres(&self) -> &[Centre] {
        &self.centres
    }

    /// Assignments of the most recent allotment run.
    pub fn assignments(&self) -> &HashMap<String, String> {
        &self.assignments
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        if self.ready {
            Ok(())
        } else {
            Err(Error::GraphNotReady)
        }
    }

    /// Fetch the map payload through `source` and build the full pipeline
    /// state: graph (or fallback grid), spatial index, snapped centres,
    /// precomputed table.
    pub fn build(
        &mut self,
        source: &dyn MapSource,
        bbox: BoundingBox,
        detail: GraphDetail,
        centres: Vec<Centre>,
    ) -> Result<BuildReport, Error> {
        bbox.validate()?;

        let fetch_started = Instant::now();
        let raw = source.fetch(&bbox, detail)?;
        let fetch_ms = fetch_started.elapsed().as_millis() as u64;
        info!("fetched {} bytes of map data", raw.len());

        let payload = MapPayload::parse(&raw)?;
        self.install(payload, bbox, centres, fetch_ms)
    }

    /// Build from an already-fetched payload (cached file, test fixture).
    pub fn build_from_payload(
        &mut self,
        payload: MapPayload,
        bbox: BoundingBox,
        centres: Vec<Centre>,
    ) -> Result<BuildReport, Error> {
        bbox.validate()?;
        self.install(payload, bbox, centres, 0)
    }

    fn install(
        &mut self,
        payload: MapPayload,
        bbox: BoundingBox,
        mut centres: Vec<Centre>,
        fetch_ms: u64,
    ) -> Result<BuildReport, Error> {
        let graph_started = Instant::now();
        let mut graph = build_road_graph(&payload);
        let mut used_fallback = false;
        if graph.is_empty() {
            warn!("map payload produced no vertices, using the simulated grid");
            graph = simulated_grid_graph(&bbox);
            used_fallback = true;
        }
        let graph_ms = graph_started.elapsed().as_millis() as u64;

        let index_started = Instant::now();
        let index = SpatialIndex::build(&graph);
        let mut centres_snapped = 0;
        for centre in centres.iter_mut() {
            centre.snapped_node_id = index
                .snap(&graph, centre.lat, centre.lon)
                .map(|node| graph.osm_id(node));
            match centre.snapped_node_id {
                Some(node) => {
                    centres_snapped += 1;
                    info!("centre {} snapped to vertex {node}", centre.centre_id);
                }
                None => warn!("centre {} could not be snapped", centre.centre_id),
            }
        }
        let index_ms = index_started.elapsed().as_millis() as u64;

        let precompute_started = Instant::now();
        // Release the previous table before the searches allocate the new one.
        self.table.clear();
        let table = build_distance_table(&graph, &centres);
        let precompute_ms = precompute_started.elapsed().as_millis() as u64;

        let report = BuildReport {
            vertex_count: graph.node_count(),
            edge_count: graph.edge_count(),
            used_fallback,
            centres_snapped,
            timings: BuildTimings {
                fetch_ms,
                graph_ms,
                index_ms,
                precompute_ms,
                total_ms: fetch_ms + graph_ms + index_ms + precompute_ms,
            },
        };

        // Replace prior state only after every phase went through.
        self.graph = graph;
        self.index = index;
        self.centres = centres;
        self.table = table;
        self.students.clear();
        self.assignments.clear();
        self.ready = true;

        Ok(report)
    }

    /// Snap the students (with main-component rescue) and run the tiered
    /// matcher against the precomputed table.
    pub fn run_allotment(&mut self, students: Vec<Student>) -> Result<AllotmentOutcome, Error> {
        self.ensure_ready()?;
        let total_started = Instant::now();

        let snap_started = Instant::now();
        let mut students = students;
        for student in students.iter_mut() {
            student.snapped_node_id = self
                .index
                .snap(&self.graph, student.lat, student.lon)
                .map(|node| self.graph.osm_id(node));
        }
        let snap_ms = snap_started.elapsed().as_millis() as u64;
        info!("snapped {} students", students.len());

        let matching_started = Instant::now();
        let assignments =
            run_tiered_allotment(&self.graph, &self.table, &students, &mut self.centres);
        let matching_ms = matching_started.elapsed().as_millis() as u64;

        let debug_distances = self.debug_distance_rows(&students);
        let unassigned: Vec<String> = students
            .iter()
            .filter(|s| !assignments.contains_key(&s.student_id))
            .map(|s| s.student_id.clone())
            .collect();
        if !unassigned.is_empty() {
            warn!("{} of {} students left unassigned", unassigned.len(), students.len());
        }

        self.students = students;
        self.assignments = assignments.clone();

        Ok(AllotmentOutcome {
            assignments,
            debug_distances,
            unassigned,
            timings: AllotmentTimings {
                snap_ms,
                matching_ms,
                total_ms: total_started.elapsed().as_millis() as u64,
            },
        })
    }

    fn debug_distance_rows(
        &self,
        students: &[Student],
    ) -> HashMap<String, BTreeMap<String, Seconds>> {
        let mut rows = HashMap::with_capacity(students.len());
        for student in students {
            let mut row = BTreeMap::new();
            if let Some(node) = student
                .snapped_node_id
                .and_then(|id| self.graph.index_of(id))
            {
                for (centre_idx, centre) in self.centres.iter().enumerate() {
                    if let Some(seconds) = self.table.get(node, centre_idx) {
                        row.insert(centre.centre_id.clone(), seconds);
                    }
                }
            }
            rows.insert(student.student_id.clone(), row);
        }
        rows
    }

    /// Point-to-point query. Vertex endpoints are used as-is; coordinate
    /// endpoints contribute their five nearest snap candidates, and the
    /// first candidate pair the search connects wins.
    ///
    /// Candidate pairs run the bidirectional search. A target with no
    /// outgoing edges cannot seed a backward frontier, so that case uses
    /// the unidirectional search instead.
    pub fn find_path(&self, from: PathEndpoint, to: PathEndpoint) -> Result<PathResult, Error> {
        self.ensure_ready()?;
        let sources = self.endpoint_candidates(from)?;
        let targets = self.endpoint_candidates(to)?;
        if sources.is_empty() || targets.is_empty() {
            return Ok(PathResult::not_found("no snap candidates near an endpoint"));
        }

        for &source in &sources {
            for &target in &targets {
                let path = if self.graph.out_degree(target) > 0 {
                    a_star_bidirectional(&self.graph, source, target)
                } else {
                    a_star(&self.graph, source, target)
                };
                if path.is_empty() {
                    continue;
                }
                let cleaned = clean_path(&self.graph, &path);
                let total_seconds = path_seconds(&self.graph, &cleaned);
                return Ok(PathResult {
                    vertices: cleaned.iter().map(|&n| self.graph.osm_id(n)).collect(),
                    coordinates: cleaned
                        .iter()
                        .map(|&n| {
                            let p = self.graph.point(n);
                            (p.y(), p.x())
                        })
                        .collect(),
                    total_seconds,
                    failure: None,
                });
            }
        }

        Ok(PathResult::not_found(
            "no connecting route between the requested endpoints",
        ))
    }

    fn endpoint_candidates(&self, endpoint: PathEndpoint) -> Result<Vec<NodeIndex>, Error> {
        match endpoint {
            PathEndpoint::Vertex(id) => {
                let node = self
                    .graph
                    .index_of(id)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown vertex id {id}")))?;
                Ok(vec![node])
            }
            PathEndpoint::Coordinate { lat, lon } => {
                if !lat.is_finite() || !lon.is_finite() {
                    return Err(Error::InvalidInput(
                        "endpoint coordinates must be finite".to_string(),
                    ));
                }
                Ok(self.index.k_nearest(&self.graph, lat, lon, PATH_CANDIDATES))
            }
        }
    }

    /// Run the per-centre precompute on demand, optionally dumping the
    /// distance and parent maps of each successful run to `dump_dir`.
    pub fn parallel_dijkstra(
        &self,
        dump_dir: Option<&Path>,
    ) -> Result<ParallelRunReport, Error> {
        self.ensure_ready()?;

        let started = Instant::now();
        let results = run_all_centre_searches(&self.graph, &self.centres);
        let parallel_ms = started.elapsed().as_millis() as u64;

        if let Some(dir) = dump_dir {
            for result in results.iter().filter(|r| r.success) {
                let distances_file = dir.join(format!("{}_distances.json", result.centre_id));
                let parents_file = dir.join(format!("{}_parents.json", result.centre_id));
                save_centre_search(result, &self.graph, &distances_file, &parents_file)?;
            }
        }

        let successful = results.iter().filter(|r| r.success).count() as u64;
        let sequential_total: u64 = results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.computation_time_ms)
            .sum();
        let average_sequential = if successful > 0 {
            sequential_total as f64 / successful as f64
        } else {
            0.0
        };
        let estimated_sequential = average_sequential * self.centres.len() as f64;
        let speedup = if parallel_ms > 0 && estimated_sequential > 0.0 {
            estimated_sequential / parallel_ms as f64
        } else {
            0.0
        };

        Ok(ParallelRunReport {
            parallel_ms,
            avg_per_centre_ms: if successful > 0 {
                sequential_total / successful
            } else {
                0
            },
            estimated_sequential_ms: estimated_sequential as u64,
            speedup,
            results,
        })
    }

    /// Diagnostics over the current graph, centres and last student batch.
    pub fn diagnostics(&self) -> Result<DiagnosticsReport, Error> {
        self.ensure_ready()?;
        Ok(collect_diagnostics(
            &self.graph,
            &self.centres,
            &self.students,
            &self.table,
            &self.assignments,
        ))
    }
}
