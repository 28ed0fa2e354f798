pub mod regular_dijkstra;
pub mod traced_dijkstra;

mod state;

pub use regular_dijkstra::dijkstra_costs;
pub use traced_dijkstra::dijkstra_with_parents;
