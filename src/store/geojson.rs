//! GeoJSON FeatureCollection store.
//!
//! Feature ids come from the feature `id` member, or else from the `id`
//! property. Geometries are read as Point, LineString, MultiLineString,
//! Polygon or MultiPolygon.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Value};

use super::{Feature, FeatureFilter, FeatureStore, MemoryStore};
use crate::io::{finalize_write, open_for_write};

#[derive(Clone, Debug, Default)]
pub struct GeoJsonStore {
    inner: MemoryStore,
    id_attribute: String,
}

impl GeoJsonStore {
    pub fn load(path: &Path, id_attribute: &str) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_bytes(&bytes, id_attribute).with_context(|| format!("parse GeoJSON {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8], id_attribute: &str) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).context("Failed to parse GeoJSON bytes")?;
        let Some(features) = value["features"].as_array() else {
            bail!("not a FeatureCollection: missing features array");
        };

        let mut parsed = Vec::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            let properties = feature["properties"].as_object().cloned().unwrap_or_default();
            let id = match (&feature["id"], properties.get(id_attribute)) {
                (Value::String(s), _) => s.clone(),
                (Value::Number(n), _) => n.to_string(),
                (_, Some(Value::String(s))) => s.clone(),
                (_, Some(Value::Number(n))) => n.to_string(),
                _ => i.to_string(),
            };
            let geometry = parse_geometry(&feature["geometry"]).with_context(|| format!("feature {id}"))?;
            parsed.push(Feature { id, geometry, properties });
        }
        Ok(Self { inner: MemoryStore::new(parsed), id_attribute: id_attribute.to_string() })
    }

    pub fn from_features(features: Vec<Feature>, id_attribute: &str) -> Self {
        Self { inner: MemoryStore::new(features), id_attribute: id_attribute.to_string() }
    }

    #[inline]
    pub fn len(&self) -> usize { self.inner.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    pub fn get(&self, id: &str) -> Option<&Feature> { self.inner.get(id) }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let features: Vec<Value> = self.inner.features(&FeatureFilter::all())?
            .iter()
            .map(|f| {
                let mut properties = f.properties.clone();
                properties.entry(self.id_attribute.clone()).or_insert_with(|| Value::String(f.id.clone()));
                json!({
                    "type": "Feature",
                    "id": f.id,
                    "geometry": geometry_json(&f.geometry),
                    "properties": properties,
                })
            })
            .collect();

        let feature_collection = json!({ "type": "FeatureCollection", "features": features });
        serde_json::to_vec(&feature_collection).context("Failed to serialize GeoJSON to bytes")
    }

    /// Write the collection through a temporary file renamed over `path`.
    pub fn save(&self, path: &Path, force: bool) -> Result<()> {
        let bytes = self.to_bytes()?;
        let mut pending = open_for_write(path, force)?;
        pending.write_all(&bytes).with_context(|| format!("write {}", path.display()))?;
        finalize_write(pending)
    }
}

impl FeatureStore for GeoJsonStore {
    fn features(&self, filter: &FeatureFilter) -> Result<Vec<Feature>> { self.inner.features(filter) }

    fn count(&self, filter: &FeatureFilter) -> Result<usize> { self.inner.count(filter) }

    fn modify_feature(&mut self, feature: &Feature) -> Result<()> { self.inner.modify_feature(feature) }
}

// ---------------------------------------------------------------------------
// Geometry decoding
// ---------------------------------------------------------------------------

fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let kind = value["type"].as_str().ok_or_else(|| anyhow!("geometry has no type"))?;
    let coords = &value["coordinates"];
    Ok(match kind {
        "Point" => Geometry::Point(Point(parse_coord(coords)?)),
        "LineString" => Geometry::LineString(parse_line(coords)?),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            array(coords)?.iter().map(parse_line).collect::<Result<_>>()?,
        )),
        "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            array(coords)?.iter().map(parse_polygon).collect::<Result<_>>()?,
        )),
        other => bail!("unsupported geometry type {other}"),
    })
}

fn array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("Invalid coordinates: expected an array"))
}

fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pair = array(value)?;
    let x = pair.first().and_then(Value::as_f64).ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
    let y = pair.get(1).and_then(Value::as_f64).ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
    Ok(Coord { x, y })
}

fn parse_line(value: &Value) -> Result<LineString<f64>> {
    Ok(LineString(array(value)?.iter().map(parse_coord).collect::<Result<_>>()?))
}

/// Parse polygon rings, closing any ring left open.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(value)?.iter().map(|ring| {
        let mut ring = parse_line(ring)?;
        ring.close();
        Ok(ring)
    }).collect::<Result<Vec<_>>>()?;
    if rings.is_empty() { bail!("Invalid Polygon: missing exterior ring") }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

// ---------------------------------------------------------------------------
// Geometry encoding
// ---------------------------------------------------------------------------

fn coords_json(ls: &LineString<f64>) -> Vec<[f64; 2]> {
    ls.coords().map(|c| [c.x, c.y]).collect()
}

fn polygon_json(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors()).map(coords_json).collect()
}

fn geometry_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": [p.x(), p.y()] }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": coords_json(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.iter().map(coords_json).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_json(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.iter().map(polygon_json).collect::<Vec<_>>(),
        }),
        _ => Value::Null,
    }
}
