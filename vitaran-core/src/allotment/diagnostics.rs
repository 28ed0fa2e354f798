//! Derived diagnostics over the last build and allotment run. Read-only:
//! collecting a report never mutates engine state.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::Serialize;

use super::precompute::DistanceTable;
use crate::geometry::haversine_metres;
use crate::model::{Category, Centre, RoadGraph, Student, COMPONENT_ISOLATED};
use crate::{OsmNodeId, Seconds};

/// A second-best centre within this margin of the best marks a near-tie,
/// where snapping noise could flip the assignment.
const NEAR_TIE_SECONDS: f64 = 20.0;

/// Snap distances beyond this are counted as suspect in the summary.
const LARGE_SNAP_METRES: f64 = 100.0;

#[derive(Debug, Clone, Serialize)]
pub struct CentreReport {
    pub centre_id: String,
    pub lat: f64,
    pub lon: f64,
    pub snapped_node_id: Option<OsmNodeId>,
    pub assigned_students: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student_id: String,
    pub lat: f64,
    pub lon: f64,
    pub category: Category,
    pub snapped_node_id: Option<OsmNodeId>,
    /// Great-circle metres between the student and the snapped vertex.
    pub snap_distance_m: Option<f64>,
    pub assigned_centre_id: Option<String>,
    /// Drive seconds to every centre; `None` marks an unreachable centre.
    pub centre_seconds: BTreeMap<String, Option<Seconds>>,
    /// Component of the snapped vertex after any main-component rescue.
    pub component_id: i32,
    pub reachable_centres: usize,
    /// The second-best centre is within 20 s of the best.
    pub near_tie: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSummary {
    pub unassigned_count: usize,
    pub large_snap_count: usize,
    pub mean_snap_distance_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub student_count: usize,
    pub centre_count: usize,
    pub centres: Vec<CentreReport>,
    pub students: Vec<StudentReport>,
    pub summary: DiagnosticsSummary,
}

/// Assemble the report from the current engine state.
pub fn collect_diagnostics(
    graph: &RoadGraph,
    centres: &[Centre],
    students: &[Student],
    table: &DistanceTable,
    assignments: &HashMap<String, String>,
) -> DiagnosticsReport {
    let mut assigned_per_centre: HashMap<&str, usize> = HashMap::new();
    for centre_id in assignments.values() {
        *assigned_per_centre.entry(centre_id.as_str()).or_insert(0) += 1;
    }

    let centre_reports: Vec<CentreReport> = centres
        .iter()
        .map(|centre| CentreReport {
            centre_id: centre.centre_id.clone(),
            lat: centre.lat,
            lon: centre.lon,
            snapped_node_id: centre.snapped_node_id,
            assigned_students: assigned_per_centre
                .get(centre.centre_id.as_str())
                .copied()
                .unwrap_or(0),
        })
        .collect();

    let mut unassigned_count = 0;
    let mut large_snap_count = 0;
    let mut snap_distance_sum = 0.0;
    let mut snap_count = 0usize;

    let student_reports: Vec<StudentReport> = students
        .iter()
        .map(|student| {
            let snapped = student
                .snapped_node_id
                .and_then(|id| graph.index_of(id));

            let snap_distance_m = snapped.map(|node| {
                let d = haversine_metres(student.point(), graph.point(node));
                snap_distance_sum += d;
                snap_count += 1;
                if d > LARGE_SNAP_METRES {
                    large_snap_count += 1;
                }
                d
            });

            let mut centre_seconds = BTreeMap::new();
            let mut reachable_centres = 0;
            let mut best = Seconds::INFINITY;
            let mut second_best = Seconds::INFINITY;
            for (centre_idx, centre) in centres.iter().enumerate() {
                let seconds = snapped.and_then(|node| table.get(node, centre_idx));
                if let Some(s) = seconds {
                    reachable_centres += 1;
                    if s < best {
                        second_best = best;
                        best = s;
                    } else if s < second_best {
                        second_best = s;
                    }
                }
                centre_seconds.insert(centre.centre_id.clone(), seconds);
            }

            let assigned_centre_id = assignments.get(&student.student_id).cloned();
            if assigned_centre_id.is_none() {
                unassigned_count += 1;
            }

            StudentReport {
                student_id: student.student_id.clone(),
                lat: student.lat,
                lon: student.lon,
                category: student.category,
                snapped_node_id: student.snapped_node_id,
                snap_distance_m,
                assigned_centre_id,
                centre_seconds,
                component_id: snapped
                    .map(|node| graph.component(node))
                    .unwrap_or(COMPONENT_ISOLATED),
                reachable_centres,
                near_tie: second_best.is_finite() && (second_best - best).abs() < NEAR_TIE_SECONDS,
            }
        })
        .collect();

    DiagnosticsReport {
        student_count: students.len(),
        centre_count: centres.len(),
        centres: centre_reports,
        students: student_reports,
        summary: DiagnosticsSummary {
            unassigned_count,
            large_snap_count,
            mean_snap_distance_m: if snap_count > 0 {
                snap_distance_sum / snap_count as f64
            } else {
                0.0
            },
        },
    }
}
