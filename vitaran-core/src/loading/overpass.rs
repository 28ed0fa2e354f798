//! Overpass-style map payload contract and the fetch seam.
//!
//! The core never performs network I/O itself; a [`MapSource`]
//! implementation (HTTP client, cached file, test fixture) hands over the
//! raw JSON document and [`MapPayload::parse`] turns it into typed
//! elements.

use std::collections::HashMap;

use serde::Deserialize;

use super::config::{BoundingBox, GraphDetail};
use crate::{Error, OsmNodeId};

/// One element of the Overpass `elements` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MapElement {
    Node {
        id: OsmNodeId,
        lat: f64,
        lon: f64,
    },
    Way {
        #[serde(default)]
        nodes: Vec<OsmNodeId>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
}

/// Parsed map payload as handed to the graph builder.
#[derive(Debug, Clone, Default)]
pub struct MapPayload {
    pub elements: Vec<MapElement>,
}

impl MapPayload {
    /// Parse an Overpass JSON document. Individual elements that fail to
    /// deserialise (unknown types, missing coordinates) are skipped; only a
    /// document that is not JSON at all is an error.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        #[derive(Deserialize)]
        struct RawPayload {
            #[serde(default)]
            elements: Vec<serde_json::Value>,
        }

        let raw: RawPayload = serde_json::from_str(raw)?;
        let elements = raw
            .elements
            .into_iter()
            .map(serde_json::from_value)
            .filter_map(Result::ok)
            .collect();
        Ok(Self { elements })
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Transport seam for obtaining the raw map payload for a region.
pub trait MapSource {
    fn fetch(&self, bbox: &BoundingBox, detail: GraphDetail) -> Result<String, Error>;
}

/// The Overpass QL query for a bounding box at the given detail level.
/// `(._;>;)` recurses down so every vertex referenced by a way is included.
pub fn overpass_query(bbox: &BoundingBox, detail: GraphDetail) -> String {
    format!(
        "[out:json][timeout:60][bbox:{:.6},{:.6},{:.6},{:.6}];way[highway~\"^({})$\"];(._;>;);out body;",
        bbox.min_lat,
        bbox.min_lon,
        bbox.max_lat,
        bbox.max_lon,
        detail.highway_filter()
    )
}
