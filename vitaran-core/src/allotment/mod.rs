//! Centre precompute, the travel-time lookup table, the tiered matcher and
//! the diagnostics view.

pub mod diagnostics;
pub mod matching;
pub mod precompute;

pub use diagnostics::{collect_diagnostics, DiagnosticsReport};
pub use matching::{is_valid_assignment, run_tiered_allotment};
pub use precompute::{
    build_distance_table, run_all_centre_searches, run_centre_search, save_centre_search,
    CentreSearchResult, DistanceTable,
};
