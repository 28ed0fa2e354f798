//! Tiered greedy capacitated matching over the precomputed table.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use log::info;

use super::precompute::DistanceTable;
use crate::model::{Category, Centre, RoadGraph, Student};
use crate::Seconds;

/// Candidate pairing competing inside one tier. Ordered by ascending
/// travel time, then student id, then centre id, so the pop order and with
/// it the whole allotment is deterministic.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    seconds: Seconds,
    student_id: String,
    centre_id: String,
    centre: usize,
}

impl Eq for Candidate {}

// Min-heap (reversed from standard Rust BinaryHeap).
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .seconds
            .total_cmp(&self.seconds)
            .then_with(|| other.student_id.cmp(&self.student_id))
            .then_with(|| other.centre_id.cmp(&self.centre_id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Eligibility extension point for future predicates (wheelchair access,
/// female-only centres). All centres accept all students in the current
/// data model.
pub fn is_valid_assignment(_student: &Student, _centre: &Centre) -> bool {
    true
}

/// Tiered greedy matching: male, then pwd, then female. Inside a tier all
/// (student, centre) pairs with a finite table entry compete by ascending
/// travel time; a pop commits unless the student was already assigned or
/// the centre is full. Centre loads are reset first and updated as
/// assignments commit.
///
/// Students whose snapped vertex is absent from the table, or whose every
/// reachable centre fills up first, stay out of the returned mapping.
pub fn run_tiered_allotment(
    graph: &RoadGraph,
    table: &DistanceTable,
    students: &[Student],
    centres: &mut [Centre],
) -> HashMap<String, String> {
    for centre in centres.iter_mut() {
        centre.current_load = 0;
    }
    let mut assignments: HashMap<String, String> = HashMap::new();

    for tier in [Category::Male, Category::Pwd, Category::Female] {
        let mut heap = BinaryHeap::new();

        for student in students.iter().filter(|s| s.category == tier) {
            let Some(snapped) = student
                .snapped_node_id
                .and_then(|id| graph.index_of(id))
            else {
                continue;
            };
            for (centre_idx, centre) in centres.iter().enumerate() {
                if !is_valid_assignment(student, centre) {
                    continue;
                }
                let Some(seconds) = table.get(snapped, centre_idx) else {
                    continue;
                };
                heap.push(Candidate {
                    seconds,
                    student_id: student.student_id.clone(),
                    centre_id: centre.centre_id.clone(),
                    centre: centre_idx,
                });
            }
        }

        let before = assignments.len();
        while let Some(candidate) = heap.pop() {
            if assignments.contains_key(&candidate.student_id) {
                continue;
            }
            let centre = &mut centres[candidate.centre];
            if !centre.has_capacity() {
                continue;
            }
            centre.current_load += 1;
            assignments.insert(candidate.student_id, candidate.centre_id);
        }
        info!(
            "assigned {} students in the {} tier",
            assignments.len() - before,
            tier.as_str()
        );
    }

    assignments
}
