use anyhow::{bail, Result};

use super::{Feature, FeatureFilter, FeatureStore};

/// Features held in memory, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    features: Vec<Feature>,
}

impl MemoryStore {
    pub fn new(features: Vec<Feature>) -> Self { Self { features } }

    #[inline]
    pub fn len(&self) -> usize { self.features.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.features.is_empty() }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn push(&mut self, feature: Feature) { self.features.push(feature) }

    pub fn into_features(self) -> Vec<Feature> { self.features }
}

impl FeatureStore for MemoryStore {
    fn features(&self, filter: &FeatureFilter) -> Result<Vec<Feature>> {
        Ok(self.features.iter().filter(|f| filter.matches(f)).cloned().collect())
    }

    fn count(&self, filter: &FeatureFilter) -> Result<usize> {
        Ok(self.features.iter().filter(|f| filter.matches(f)).count())
    }

    fn modify_feature(&mut self, feature: &Feature) -> Result<()> {
        let Some(slot) = self.features.iter_mut().find(|f| f.id == feature.id) else {
            bail!("no feature with id {}", feature.id);
        };
        slot.geometry = feature.geometry.clone();
        slot.properties = feature.properties.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Geometry};

    #[test]
    fn modify_replaces_by_id() {
        let mut store = MemoryStore::new(vec![Feature::new("a", Geometry::Point(point!(x: 0.0, y: 0.0)))]);
        store.modify_feature(&Feature::new("a", Geometry::Point(point!(x: 1.0, y: 1.0)))).unwrap();
        assert_eq!(store.get("a").unwrap().geometry, Geometry::Point(point!(x: 1.0, y: 1.0)));
        assert!(store.modify_feature(&Feature::new("b", Geometry::Point(point!(x: 1.0, y: 1.0)))).is_err());
    }
}
