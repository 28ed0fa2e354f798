use serde::{Deserialize, Serialize};

use crate::Error;

/// Geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Reject empty or non-finite boxes before any fetch happens.
    pub fn validate(&self) -> Result<(), Error> {
        let coords = [self.min_lat, self.min_lon, self.max_lat, self.max_lon];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidInput(
                "bounding box coordinates must be finite".to_string(),
            ));
        }
        if self.min_lat >= self.max_lat || self.min_lon >= self.max_lon {
            return Err(Error::InvalidInput(format!(
                "empty bounding box ({}, {}) - ({}, {})",
                self.min_lat, self.min_lon, self.max_lat, self.max_lon
            )));
        }
        Ok(())
    }
}

/// Road-category filter applied when fetching map data.
///
/// Low keeps major roads only, medium adds the residential fabric, high
/// adds motorways and trunks on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDetail {
    Low,
    #[default]
    Medium,
    High,
}

impl GraphDetail {
    /// Alternation of highway categories for the Overpass regexp filter.
    pub fn highway_filter(self) -> &'static str {
        match self {
            GraphDetail::Low => "primary|secondary|tertiary",
            GraphDetail::Medium => {
                "primary|secondary|tertiary|residential|living_street|service|unclassified"
            }
            GraphDetail::High => {
                "motorway|trunk|primary|secondary|tertiary|residential|living_street|service|unclassified"
            }
        }
    }
}
