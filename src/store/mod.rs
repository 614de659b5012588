//! Feature sources and write-back.
//!
//! The matcher reads features through [`FeatureStore`] and writes modified
//! geometries back by id. [`MemoryStore`] keeps everything in memory;
//! [`GeoJsonStore`] loads and saves a GeoJSON FeatureCollection.

mod geojson;
mod memory;

pub use geojson::GeoJsonStore;
pub use memory::MemoryStore;

use anyhow::Result;
use geo::Geometry;
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: String,
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: Geometry<f64>) -> Self {
        Self { id: id.into(), geometry, properties: Map::new() }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Attribute as text; numbers and booleans are formatted.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// One attribute condition. `Like` patterns use `%` for any run of
/// characters and `_` for exactly one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Equals { attribute: String, value: String },
    Like { attribute: String, pattern: String },
    NotLike { attribute: String, pattern: String },
}

impl Predicate {
    pub fn equals(attribute: &str, value: &str) -> Self {
        Predicate::Equals { attribute: attribute.into(), value: value.into() }
    }

    pub fn like(attribute: &str, pattern: &str) -> Self {
        Predicate::Like { attribute: attribute.into(), pattern: pattern.into() }
    }

    pub fn not_like(attribute: &str, pattern: &str) -> Self {
        Predicate::NotLike { attribute: attribute.into(), pattern: pattern.into() }
    }

    /// Missing attributes fail `Equals` and `Like` and pass `NotLike`.
    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Predicate::Equals { attribute, value } => feature.attribute(attribute).is_some_and(|v| &v == value),
            Predicate::Like { attribute, pattern } => feature.attribute(attribute).is_some_and(|v| like(&v, pattern)),
            Predicate::NotLike { attribute, pattern } => !feature.attribute(attribute).is_some_and(|v| like(&v, pattern)),
        }
    }
}

/// Conjunction of predicates; the empty filter selects everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureFilter {
    predicates: Vec<Predicate>,
}

impl FeatureFilter {
    pub fn all() -> Self { Self::default() }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        self.predicates.iter().all(|p| p.matches(feature))
    }
}

pub trait FeatureStore {
    fn features(&self, filter: &FeatureFilter) -> Result<Vec<Feature>>;

    fn count(&self, filter: &FeatureFilter) -> Result<usize> {
        Ok(self.features(filter)?.len())
    }

    /// Replace the feature with the same id.
    fn modify_feature(&mut self, feature: &Feature) -> Result<()>;
}

fn like(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // Greedy wildcard matching with backtracking to the last `%`.
    let (mut v, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                star = Some((p, v));
                p += 1;
            }
            Some(&c) if c == '_' || c == value[v] => {
                v += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, sv)) => {
                    p = sp + 1;
                    v = sv + 1;
                    star = Some((sp, sv + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Geometry};

    fn feature(country: &str) -> Feature {
        Feature::new("f", Geometry::Point(point!(x: 0.0, y: 0.0)))
            .with_property("country", country)
            .with_property("rank", 3)
    }

    #[test]
    fn like_patterns() {
        assert!(like("fr#be", "%be%"));
        assert!(like("be", "%be%"));
        assert!(like("abc", "a_c"));
        assert!(!like("abc", "a_"));
        assert!(like("", "%"));
        assert!(!like("fr", "%be%"));
    }

    #[test]
    fn filters_are_conjunctions() {
        let f = feature("fr#be");
        assert!(FeatureFilter::all().matches(&f));
        assert!(FeatureFilter::all().and(Predicate::like("country", "%be%")).and(Predicate::equals("rank", "3")).matches(&f));
        assert!(!FeatureFilter::all().and(Predicate::equals("country", "be")).matches(&f));
        assert!(FeatureFilter::all().and(Predicate::not_like("missing", "%")).matches(&f));
    }
}
