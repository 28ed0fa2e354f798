//! End-to-end scenarios driving the engine through the public facade.

use serde_json::json;

use vitaran_core::prelude::*;

/// Overpass-style payload for a set of nodes and bidirectional or one-way
/// residential ways.
fn payload(nodes: &[(i64, f64, f64)], ways: &[(&[i64], bool)]) -> MapPayload {
    let mut elements = Vec::new();
    for &(id, lat, lon) in nodes {
        elements.push(json!({"type": "node", "id": id, "lat": lat, "lon": lon}));
    }
    for (way_nodes, oneway) in ways {
        let mut tags = json!({"highway": "residential"});
        if *oneway {
            tags["oneway"] = json!("yes");
        }
        elements.push(json!({"type": "way", "nodes": way_nodes, "tags": tags}));
    }
    MapPayload::parse(&json!({ "elements": elements }).to_string()).unwrap()
}

fn bbox() -> BoundingBox {
    BoundingBox::new(-0.5, -0.5, 0.5, 0.5)
}

fn triangle() -> MapPayload {
    payload(
        &[(1, 0.0, 0.0), (2, 0.0, 0.01), (3, 0.01, 0.0)],
        &[(&[1, 2], false), (&[2, 3], false), (&[3, 1], false)],
    )
}

struct FixtureSource(String);

impl MapSource for FixtureSource {
    fn fetch(&self, _bbox: &BoundingBox, _detail: GraphDetail) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

#[test]
fn scenario_a_one_seat_triangle() {
    let mut engine = AllotmentEngine::new();
    let report = engine
        .build_from_payload(triangle(), bbox(), vec![Centre::new("C", 0.0, 0.0, 1)])
        .unwrap();
    assert_eq!(report.vertex_count, 3);
    assert_eq!(report.edge_count, 6);
    assert!(!report.used_fallback);
    assert_eq!(report.centres_snapped, 1);

    let students = vec![
        Student::new("s1", 0.0, 0.01, Category::Male),
        Student::new("s2", 0.01, 0.0, Category::Male),
    ];
    let outcome = engine.run_allotment(students).unwrap();

    // Exactly one seat: both trips cost the same ~133 s, so the lower
    // student id wins the tie.
    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.assignments["s1"], "C");
    assert_eq!(outcome.unassigned, vec!["s2".to_string()]);

    let row = &outcome.debug_distances["s1"];
    let seconds = row["C"];
    assert!((seconds - 133.4).abs() < 2.0, "got {seconds}");
}

#[test]
fn scenario_b_island_student_is_rescued_into_the_main_component() {
    // Triangle 1-2-3 is the main component; 4-5 is an island.
    let map = payload(
        &[
            (1, 0.0, 0.0),
            (2, 0.0, 0.01),
            (3, 0.01, 0.0),
            (4, 0.3, 0.3),
            (5, 0.3, 0.31),
        ],
        &[
            (&[1, 2], false),
            (&[2, 3], false),
            (&[3, 1], false),
            (&[4, 5], false),
        ],
    );
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(map, bbox(), vec![Centre::new("C", 0.0, 0.0, 5)])
        .unwrap();

    let outcome = engine
        .run_allotment(vec![Student::new("s1", 0.3, 0.31, Category::Male)])
        .unwrap();

    // The raw nearest vertex is on the island; the rescue snap moves the
    // student onto the main component, where the centre can reach it.
    assert_eq!(outcome.assignments["s1"], "C");

    let report = engine.diagnostics().unwrap();
    let row = &report.students[0];
    let main_members = [1, 2, 3];
    assert!(main_members.contains(&row.snapped_node_id.unwrap()));
    assert_eq!(row.reachable_centres, 1);
}

#[test]
fn scenario_c_tier_order_beats_travel_time() {
    // Line 1 - 2 - 3 - 4; the centre sits at vertex 1. f1 is closest and
    // m1 farthest, yet the male tier bids first.
    let map = payload(
        &[
            (1, 0.0, 0.0),
            (2, 0.0, 0.01),
            (3, 0.0, 0.02),
            (4, 0.0, 0.03),
        ],
        &[(&[1, 2, 3, 4], false)],
    );
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(map, bbox(), vec![Centre::new("C", 0.0, 0.0, 1)])
        .unwrap();

    let outcome = engine
        .run_allotment(vec![
            Student::new("f1", 0.0, 0.01, Category::Female),
            Student::new("p1", 0.0, 0.02, Category::Pwd),
            Student::new("m1", 0.0, 0.03, Category::Male),
        ])
        .unwrap();

    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.assignments["m1"], "C");
    let mut unassigned = outcome.unassigned.clone();
    unassigned.sort();
    assert_eq!(unassigned, vec!["f1".to_string(), "p1".to_string()]);
}

#[test]
fn scenario_d_table_direction_is_centre_to_student() {
    // One-way cycle 1 -> 2 -> 3 -> 1. The precompute runs from the centre
    // outward on the forward graph, so the student at vertex 2 has a
    // finite entry and gets a seat.
    let map = payload(
        &[(1, 0.0, 0.0), (2, 0.0, 0.01), (3, 0.01, 0.005)],
        &[(&[1, 2], true), (&[2, 3], true), (&[3, 1], true)],
    );
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(map, bbox(), vec![Centre::new("C", 0.0, 0.0, 5)])
        .unwrap();

    let outcome = engine
        .run_allotment(vec![Student::new("s1", 0.0, 0.01, Category::Male)])
        .unwrap();
    assert_eq!(outcome.assignments["s1"], "C");
    assert!(outcome.debug_distances["s1"]["C"] > 0.0);
}

#[test]
fn scenario_d_variant_student_unreachable_from_the_centre() {
    // One-way chain 1 -> 2 -> 3: the centre snaps near 2, the student
    // near 1, and nothing leads from 2 back to 1.
    let map = payload(
        &[(1, 0.0, 0.0), (2, 0.0, 0.01), (3, 0.0, 0.02)],
        &[(&[1, 2, 3], true)],
    );
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(map, bbox(), vec![Centre::new("C", 0.0, 0.011, 5)])
        .unwrap();

    let outcome = engine
        .run_allotment(vec![Student::new("s1", 0.0, 0.0, Category::Male)])
        .unwrap();
    assert!(outcome.assignments.is_empty());
    assert_eq!(outcome.unassigned, vec!["s1".to_string()]);

    let report = engine.diagnostics().unwrap();
    assert_eq!(report.students[0].reachable_centres, 0);
    assert_eq!(report.summary.unassigned_count, 1);
}

#[test]
fn scenario_e_path_query_follows_the_line() {
    let map = payload(
        &[
            (1, 0.0, 0.0),
            (2, 0.0, 0.01),
            (3, 0.0, 0.02),
            (4, 0.0, 0.03),
        ],
        &[(&[1, 2, 3, 4], false)],
    );
    let mut engine = AllotmentEngine::new();
    engine.build_from_payload(map, bbox(), Vec::new()).unwrap();

    let result = engine
        .find_path(PathEndpoint::Vertex(1), PathEndpoint::Vertex(4))
        .unwrap();
    assert_eq!(result.vertices, vec![1, 2, 3, 4]);
    assert!(result.failure.is_none());
    // Three ~133 s hops at the residential default speed.
    assert!((result.total_seconds - 3.0 * 133.4).abs() < 5.0);
    assert_eq!(result.coordinates.len(), 4);

    // Coordinate endpoints snap to their nearest candidates.
    let result = engine
        .find_path(
            PathEndpoint::Coordinate { lat: 0.0001, lon: 0.0 },
            PathEndpoint::Coordinate { lat: 0.0001, lon: 0.03 },
        )
        .unwrap();
    assert_eq!(result.vertices.first(), Some(&1));
    assert_eq!(result.vertices.last(), Some(&4));
}

#[test]
fn scenario_e_one_way_line_has_no_reverse_path() {
    let map = payload(
        &[
            (1, 0.0, 0.0),
            (2, 0.0, 0.01),
            (3, 0.0, 0.02),
            (4, 0.0, 0.03),
        ],
        &[(&[1, 2, 3, 4], true)],
    );
    let mut engine = AllotmentEngine::new();
    engine.build_from_payload(map, bbox(), Vec::new()).unwrap();

    let result = engine
        .find_path(PathEndpoint::Vertex(4), PathEndpoint::Vertex(1))
        .unwrap();
    assert!(result.vertices.is_empty());
    assert!(result.failure.is_some());
    assert_eq!(result.total_seconds, 0.0);
}

#[test]
fn one_way_target_without_exits_uses_the_unidirectional_fallback() {
    // Forward along the one-way line the goal is reachable, but vertex 4
    // has no outgoing edges, so the backward frontier cannot start there
    // and the query falls back to plain A*.
    let map = payload(
        &[
            (1, 0.0, 0.0),
            (2, 0.0, 0.01),
            (3, 0.0, 0.02),
            (4, 0.0, 0.03),
        ],
        &[(&[1, 2, 3, 4], true)],
    );
    let mut engine = AllotmentEngine::new();
    engine.build_from_payload(map, bbox(), Vec::new()).unwrap();

    let result = engine
        .find_path(PathEndpoint::Vertex(1), PathEndpoint::Vertex(4))
        .unwrap();
    assert!(result.failure.is_none());
    // The terminal vertex has no outgoing edges and is trimmed by the
    // path cleaner.
    assert_eq!(result.vertices, vec![1, 2, 3]);
    assert!((result.total_seconds - 2.0 * 133.4).abs() < 5.0);
}

#[test]
fn path_query_rejects_unknown_vertices_and_bad_coordinates() {
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(triangle(), bbox(), Vec::new())
        .unwrap();

    assert!(matches!(
        engine.find_path(PathEndpoint::Vertex(999), PathEndpoint::Vertex(1)),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        engine.find_path(
            PathEndpoint::Coordinate { lat: f64::NAN, lon: 0.0 },
            PathEndpoint::Vertex(1)
        ),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn queries_before_build_refuse_service() {
    let mut engine = AllotmentEngine::new();
    assert!(matches!(
        engine.run_allotment(Vec::new()),
        Err(Error::GraphNotReady)
    ));
    assert!(matches!(
        engine.find_path(PathEndpoint::Vertex(1), PathEndpoint::Vertex(2)),
        Err(Error::GraphNotReady)
    ));
    assert!(matches!(engine.diagnostics(), Err(Error::GraphNotReady)));
    assert!(matches!(
        engine.parallel_dijkstra(None),
        Err(Error::GraphNotReady)
    ));
}

#[test]
fn empty_payload_builds_the_fallback_grid() {
    let mut engine = AllotmentEngine::new();
    let source = FixtureSource("{}".to_string());
    let report = engine
        .build(
            &source,
            BoundingBox::new(26.0, 72.0, 26.1, 72.1),
            GraphDetail::Medium,
            vec![Centre::new("C", 26.05, 72.05, 100)],
        )
        .unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.vertex_count, 80 * 80);
    assert_eq!(report.centres_snapped, 1);

    // The grid is fully routable: any two corners connect.
    let result = engine
        .find_path(
            PathEndpoint::Coordinate { lat: 26.0, lon: 72.0 },
            PathEndpoint::Coordinate { lat: 26.09, lon: 72.09 },
        )
        .unwrap();
    assert!(result.failure.is_none());
    assert!(result.total_seconds > 0.0);
}

#[test]
fn invalid_bounding_box_is_rejected_before_fetching() {
    let mut engine = AllotmentEngine::new();
    let source = FixtureSource("{}".to_string());
    let result = engine.build(
        &source,
        BoundingBox::new(27.0, 72.0, 26.0, 74.0),
        GraphDetail::Low,
        Vec::new(),
    );
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn allotment_invariants_hold_on_a_crowded_grid() {
    // 4x4 bidirectional grid, three centres with tight capacities, twelve
    // students across all tiers.
    let mut nodes = Vec::new();
    let mut ways: Vec<(Vec<i64>, bool)> = Vec::new();
    for row in 0..4i64 {
        for col in 0..4i64 {
            nodes.push((row * 4 + col + 1, row as f64 * 0.01, col as f64 * 0.01));
        }
    }
    for row in 0..4i64 {
        ways.push(((1..=4).map(|c| row * 4 + c).collect(), false));
    }
    for col in 1..=4i64 {
        ways.push(((0..4).map(|r| r * 4 + col).collect(), false));
    }
    let way_refs: Vec<(&[i64], bool)> = ways.iter().map(|(w, o)| (w.as_slice(), *o)).collect();
    let map = payload(&nodes, &way_refs);

    let centres = vec![
        Centre::new("C1", 0.0, 0.0, 2),
        Centre::new("C2", 0.03, 0.03, 2),
        Centre::new("C3", 0.0, 0.03, 1),
    ];
    let mut engine = AllotmentEngine::new();
    engine.build_from_payload(map, bbox(), centres).unwrap();

    let students: Vec<Student> = (0..12)
        .map(|i| {
            let category = match i % 3 {
                0 => Category::Male,
                1 => Category::Pwd,
                _ => Category::Female,
            };
            Student::new(
                format!("s{i:02}"),
                (i % 4) as f64 * 0.01,
                (i / 4) as f64 * 0.01,
                category,
            )
        })
        .collect();

    let outcome = engine.run_allotment(students.clone()).unwrap();

    // I1: loads add up to the number of assignments.
    let total_load: u32 = engine.centres().iter().map(|c| c.current_load).sum();
    assert_eq!(total_load as usize, outcome.assignments.len());

    // I2: no centre exceeds its capacity; all five seats get filled here.
    for centre in engine.centres() {
        assert!(centre.current_load <= centre.max_capacity);
    }
    assert_eq!(outcome.assignments.len(), 5);
    assert_eq!(outcome.unassigned.len(), 7);

    // I3: every assignment is backed by a finite precomputed distance.
    for (student_id, centre_id) in &outcome.assignments {
        assert!(outcome.debug_distances[student_id].contains_key(centre_id));
    }

    // R2: a rerun on the same inputs is identical.
    let rerun = engine.run_allotment(students).unwrap();
    assert_eq!(rerun.assignments, outcome.assignments);
    assert_eq!(rerun.unassigned, outcome.unassigned);
}

#[test]
fn boundary_cases_produce_empty_outcomes() {
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(triangle(), bbox(), vec![Centre::new("C", 0.0, 0.0, 0)])
        .unwrap();

    // Empty student list.
    let outcome = engine.run_allotment(Vec::new()).unwrap();
    assert!(outcome.assignments.is_empty());
    assert!(outcome.unassigned.is_empty());

    // Zero capacity everywhere.
    let outcome = engine
        .run_allotment(vec![Student::new("s1", 0.0, 0.01, Category::Male)])
        .unwrap();
    assert!(outcome.assignments.is_empty());
    assert_eq!(outcome.unassigned.len(), 1);

    // No centres at all: no searches run, nothing is assigned.
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(triangle(), bbox(), Vec::new())
        .unwrap();
    let outcome = engine
        .run_allotment(vec![Student::new("s1", 0.0, 0.01, Category::Male)])
        .unwrap();
    assert!(outcome.assignments.is_empty());
    let report = engine.parallel_dijkstra(None).unwrap();
    assert!(report.results.is_empty());
}

#[test]
fn parallel_dijkstra_reports_and_dumps_per_centre_results() {
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(
            triangle(),
            bbox(),
            vec![
                Centre::new("ALPHA", 0.0, 0.0, 5),
                Centre::new("BETA", 0.0, 0.01, 5),
            ],
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let report = engine.parallel_dijkstra(Some(dir.path())).unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.successful(), 2);
    assert_eq!(report.failed(), 0);
    // Sub-millisecond searches round to zero, so only sign is checkable.
    assert!(report.speedup >= 0.0);
    assert!(report.estimated_sequential_ms >= report.avg_per_centre_ms);
    // Joined in centre insertion order.
    assert_eq!(report.results[0].centre_id, "ALPHA");
    assert_eq!(report.results[1].centre_id, "BETA");
    assert_eq!(report.results[0].reachable_count(), 3);

    for centre in ["ALPHA", "BETA"] {
        assert!(dir.path().join(format!("{centre}_distances.json")).exists());
        assert!(dir.path().join(format!("{centre}_parents.json")).exists());
    }
}

#[test]
fn rebuild_replaces_prior_state() {
    let mut engine = AllotmentEngine::new();
    engine
        .build_from_payload(triangle(), bbox(), vec![Centre::new("C", 0.0, 0.0, 1)])
        .unwrap();
    engine
        .run_allotment(vec![Student::new("s1", 0.0, 0.01, Category::Male)])
        .unwrap();
    assert_eq!(engine.assignments().len(), 1);

    // A new build clears assignments and swaps the centre set.
    let report = engine
        .build_from_payload(triangle(), bbox(), vec![Centre::new("D", 0.01, 0.0, 3)])
        .unwrap();
    assert_eq!(report.centres_snapped, 1);
    assert!(engine.assignments().is_empty());
    assert_eq!(engine.centres().len(), 1);
    assert_eq!(engine.centres()[0].centre_id, "D");
}
