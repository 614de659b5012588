//! Run configuration.
//!
//! Everything is read from one JSON document; every field has a default so
//! a partial (or empty) document is valid.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::matching::GroupRule;
use crate::network::DEFAULT_SEARCH_BUDGET;

/// Attribute names looked up on input features.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub id: String,
    pub country: String,
    pub boundary_type: String,
    pub land_cover_type: String,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            id: "id".into(),
            country: "country".into(),
            boundary_type: "boundary_type".into(),
            land_cover_type: "land_cover_type".into(),
        }
    }
}

/// Attribute values with a special meaning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Values {
    pub type_coastline: String,
    pub type_land_area: String,
}

impl Default for Values {
    fn default() -> Self {
        Self { type_coastline: "coastline".into(), type_land_area: "land_area".into() }
    }
}

/// Numeric tolerances, in map units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Rejection distance when matching a whole ring against a closed boundary.
    pub boundary_max_dist: f64,
    /// Search radius for boundary projections, paths and sharp-corner candidates.
    pub boundary_search_dist: f64,
    /// Snap radius onto boundary vertices.
    pub boundary_snap_dist: f64,
    pub coast_max_dist: f64,
    pub coast_search_dist: f64,
    pub coast_snap_dist: f64,
    /// Terminal segments shorter than this are dropped after trimming.
    pub segment_min_length: f64,
    /// Precision of landmask endpoint insertion into AU rings.
    pub refine_precision: f64,
    /// Node expansions allowed per path search.
    pub path_search_budget: usize,
    /// Extra guided path attempts, each with a doubled corridor.
    pub path_retries: u32,
    pub group_rule: GroupRule,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            boundary_max_dist: 50.0,
            boundary_search_dist: 20.0,
            boundary_snap_dist: 1.0,
            coast_max_dist: 50.0,
            coast_search_dist: 20.0,
            coast_snap_dist: 1.0,
            segment_min_length: 1.0,
            refine_precision: 0.1,
            path_search_budget: DEFAULT_SEARCH_BUDGET,
            path_retries: 1,
            group_rule: GroupRule::default(),
        }
    }
}

impl Tolerances {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("boundary_max_dist", self.boundary_max_dist),
            ("boundary_search_dist", self.boundary_search_dist),
            ("coast_max_dist", self.coast_max_dist),
            ("coast_search_dist", self.coast_search_dist),
            ("refine_precision", self.refine_precision),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 { bail!("{name} must be finite and positive, got {value}") }
        }

        let non_negative = [
            ("boundary_snap_dist", self.boundary_snap_dist),
            ("coast_snap_dist", self.coast_snap_dist),
            ("segment_min_length", self.segment_min_length),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 { bail!("{name} must be finite and non-negative, got {value}") }
        }

        if self.path_search_budget == 0 { bail!("path_search_budget must be at least 1") }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub attributes: Attributes,
    pub values: Values,
    pub tolerances: Tolerances,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text).context("Failed to parse configuration")?;
        config.tolerances.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tolerances.refine_precision, 0.1);
    }

    #[test]
    fn partial_sections_are_merged() {
        let config = Config::from_json(
            r#"{ "tolerances": { "boundary_search_dist": 5.0, "group_rule": "strict" },
                 "values": { "type_coastline": "coast" } }"#,
        ).unwrap();
        assert_eq!(config.tolerances.boundary_search_dist, 5.0);
        assert_eq!(config.tolerances.group_rule, GroupRule::Strict);
        assert_eq!(config.tolerances.boundary_snap_dist, 1.0);
        assert_eq!(config.values.type_coastline, "coast");
        assert_eq!(config.values.type_land_area, "land_area");
    }

    #[test]
    fn rejects_non_positive_distances() {
        assert!(Config::from_json(r#"{ "tolerances": { "boundary_max_dist": 0.0 } }"#).is_err());
        assert!(Config::from_json(r#"{ "tolerances": { "segment_min_length": -1.0 } }"#).is_err());
    }
}
