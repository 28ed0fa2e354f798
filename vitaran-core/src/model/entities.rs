//! Students and examination centres.

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::OsmNodeId;

/// Student priority band. The matcher runs the tiers in the fixed order
/// male, pwd, female; earlier tiers bid for centres first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Male,
    Pwd,
    Female,
}

impl Category {
    /// Parse a category string; anything unrecognised is treated as `male`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "female" => Category::Female,
            "pwd" => Category::Pwd,
            _ => Category::Male,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Male => "male",
            Category::Pwd => "pwd",
            Category::Female => "female",
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::parse(&raw))
    }
}

/// Examination centre with a finite seat capacity.
///
/// The feature flags are carried for future eligibility predicates; the
/// matcher does not consult them yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Centre {
    pub centre_id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub max_capacity: u32,
    #[serde(default)]
    pub current_load: u32,
    #[serde(default)]
    pub has_wheelchair_access: bool,
    #[serde(default)]
    pub is_female_only: bool,
    /// Main-component vertex the centre was snapped to, set during build.
    #[serde(default)]
    pub snapped_node_id: Option<OsmNodeId>,
}

impl Centre {
    pub fn new(centre_id: impl Into<String>, lat: f64, lon: f64, max_capacity: u32) -> Self {
        Self {
            centre_id: centre_id.into(),
            lat,
            lon,
            max_capacity,
            current_load: 0,
            has_wheelchair_access: false,
            is_female_only: false,
            snapped_node_id: None,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    pub fn has_capacity(&self) -> bool {
        self.current_load < self.max_capacity
    }
}

/// A student to be assigned. Supplied per allotment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub category: Category,
    /// Routable vertex the student was snapped to, set during the run.
    #[serde(default)]
    pub snapped_node_id: Option<OsmNodeId>,
}

impl Student {
    pub fn new(student_id: impl Into<String>, lat: f64, lon: f64, category: Category) -> Self {
        Self {
            student_id: student_id.into(),
            lat,
            lon,
            category,
            snapped_node_id: None,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}
