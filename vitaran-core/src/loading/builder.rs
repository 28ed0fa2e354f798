//! Road-graph construction from the map payload, and the simulated grid
//! used when a region yields no map data.

use log::{info, warn};

use super::config::BoundingBox;
use super::overpass::{MapElement, MapPayload};
use crate::geometry::haversine_metres;
use crate::model::RoadGraph;

/// Speed assumed when a way has no usable category or maxspeed, km/h.
const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Side length of the fallback grid, in vertices.
const FALLBACK_GRID_SIZE: usize = 80;

/// Default speed per highway category, km/h.
fn default_speed_kmh(highway: &str) -> f64 {
    match highway {
        "motorway" => 100.0,
        "trunk" => 90.0,
        "primary" => 80.0,
        "secondary" => 60.0,
        "tertiary" => 50.0,
        "unclassified" => 40.0,
        "residential" => 30.0,
        "service" => 20.0,
        "living_street" => 20.0,
        _ => DEFAULT_SPEED_KMH,
    }
}

/// Numeric prefix of a maxspeed tag ("50", "50 mph" both give 50).
/// Anything without a leading positive number is ignored.
fn parse_maxspeed(raw: &str) -> Option<f64> {
    let prefix: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    prefix.parse::<f64>().ok().filter(|speed| *speed > 0.0)
}

/// Build the road graph from a parsed map payload.
///
/// Ways without a `highway` tag are not routable and are skipped, as are
/// segment endpoints that never appeared as node elements. A way is
/// one-way when its `oneway` tag is `yes`, `true` or `1`; otherwise both
/// directions are emitted. The builder never aborts on a bad record; an
/// empty payload simply produces an empty graph.
pub fn build_road_graph(payload: &MapPayload) -> RoadGraph {
    let mut graph = RoadGraph::new();

    for element in &payload.elements {
        if let MapElement::Node { id, lat, lon } = element {
            graph.upsert_node(*id, *lat, *lon);
        }
    }
    info!("stored {} vertices from map payload", graph.node_count());

    let mut oneway_count = 0usize;
    for element in &payload.elements {
        let MapElement::Way { nodes, tags } = element else {
            continue;
        };
        let Some(highway) = tags.get("highway") else {
            continue;
        };

        let is_oneway = tags
            .get("oneway")
            .is_some_and(|v| matches!(v.as_str(), "yes" | "true" | "1"));
        let speed_kmh = tags
            .get("maxspeed")
            .and_then(|raw| parse_maxspeed(raw))
            .unwrap_or_else(|| default_speed_kmh(highway));

        for pair in nodes.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let (Some(u), Some(v)) = (graph.index_of(from), graph.index_of(to)) else {
                continue;
            };
            let metres = haversine_metres(graph.point(u), graph.point(v));
            let seconds = metres / (speed_kmh * 1000.0 / 3600.0);

            graph.add_edge_by_id(from, to, seconds);
            if is_oneway {
                oneway_count += 1;
            } else {
                graph.add_edge_by_id(to, from, seconds);
            }
        }
    }

    info!(
        "graph built with {} vertices and {} directed edges ({} one-way segments)",
        graph.node_count(),
        graph.edge_count(),
        oneway_count
    );
    if graph.is_empty() {
        warn!("map payload produced an empty graph");
    }

    graph.compute_components();
    graph
}

/// Synthesise an 80x80 grid graph over the bounding box, 8-connected,
/// with drive-time edges at the default speed. Used only when the map
/// payload yields zero vertices.
pub fn simulated_grid_graph(bbox: &BoundingBox) -> RoadGraph {
    info!("generating simulated {FALLBACK_GRID_SIZE}x{FALLBACK_GRID_SIZE} fallback grid");

    let mut graph = RoadGraph::new();
    let n = FALLBACK_GRID_SIZE;
    let lat_step = (bbox.max_lat - bbox.min_lat) / n as f64;
    let lon_step = (bbox.max_lon - bbox.min_lon) / n as f64;
    let default_mps = DEFAULT_SPEED_KMH * 1000.0 / 3600.0;

    let cell_id = |row: usize, col: usize| (row * n + col + 1) as i64;

    let mut grid = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let lat = bbox.min_lat + row as f64 * lat_step;
            let lon = bbox.min_lon + col as f64 * lon_step;
            grid.push(graph.upsert_node(cell_id(row, col), lat, lon));
        }
    }

    const DIRECTIONS: [(isize, isize); 8] = [
        (0, 1),
        (1, 0),
        (1, 1),
        (1, -1),
        (0, -1),
        (-1, 0),
        (-1, -1),
        (-1, 1),
    ];

    for row in 0..n {
        for col in 0..n {
            for (dr, dc) in DIRECTIONS {
                let (nr, nc) = (row as isize + dr, col as isize + dc);
                if nr < 0 || nr >= n as isize || nc < 0 || nc >= n as isize {
                    continue;
                }
                let u = grid[row * n + col];
                let v = grid[nr as usize * n + nc as usize];
                let metres = haversine_metres(graph.point(u), graph.point(v));
                graph.add_edge_by_id(cell_id(row, col), cell_id(nr as usize, nc as usize), metres / default_mps);
            }
        }
    }

    info!(
        "simulated graph generated with {} vertices and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    graph.compute_components();
    graph
}
