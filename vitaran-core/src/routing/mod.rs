//! Shortest-path algorithms over the road graph.

pub mod astar;
pub mod bidirectional;
pub mod dijkstra;
pub mod path;

pub use astar::a_star;
pub use bidirectional::a_star_bidirectional;
pub use dijkstra::{dijkstra_costs, dijkstra_with_parents};
pub use path::{clean_path, path_seconds};
