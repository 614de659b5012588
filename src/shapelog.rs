//! Diagnostic geometry dumps.
//!
//! Intermediate artifacts (gap parts, contact points, trimmed parts, paths,
//! resulting polygons) are buffered per named layer and written as one
//! shapefile per layer by [`ShapeLogger::close`]. A logger created with
//! [`ShapeLogger::disabled`] drops everything.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use geo::{Coord, LineString, MultiPolygon};
use shapefile as shp;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use tracing::{debug, warn};

const ID_FIELD: &str = "id";
const ID_FIELD_LENGTH: u8 = 80;

enum Layer {
    Points(Vec<(String, Coord<f64>)>),
    Lines(Vec<(String, LineString<f64>)>),
    Polygons(Vec<(String, MultiPolygon<f64>)>),
}

impl Layer {
    fn len(&self) -> usize {
        match self {
            Layer::Points(v) => v.len(),
            Layer::Lines(v) => v.len(),
            Layer::Polygons(v) => v.len(),
        }
    }
}

pub struct ShapeLogger {
    dir: Option<PathBuf>,
    layers: BTreeMap<String, Layer>,
}

impl ShapeLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: Some(dir.into()), layers: BTreeMap::new() }
    }

    pub fn disabled() -> Self {
        Self { dir: None, layers: BTreeMap::new() }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool { self.dir.is_some() }

    /// Number of features buffered in `layer`.
    pub fn count(&self, layer: &str) -> usize {
        self.layers.get(layer).map_or(0, Layer::len)
    }

    pub fn point(&mut self, layer: &str, id: &str, c: Coord<f64>) {
        if !self.is_enabled() { return }
        match self.layers.entry(layer.to_string()).or_insert_with(|| Layer::Points(Vec::new())) {
            Layer::Points(v) => v.push((id.to_string(), c)),
            _ => warn!("[shapelog] layer {layer} does not hold points"),
        }
    }

    pub fn line(&mut self, layer: &str, id: &str, ls: &LineString<f64>) {
        if !self.is_enabled() || ls.0.len() < 2 { return }
        match self.layers.entry(layer.to_string()).or_insert_with(|| Layer::Lines(Vec::new())) {
            Layer::Lines(v) => v.push((id.to_string(), ls.clone())),
            _ => warn!("[shapelog] layer {layer} does not hold lines"),
        }
    }

    pub fn polygon(&mut self, layer: &str, id: &str, mp: &MultiPolygon<f64>) {
        if !self.is_enabled() || mp.0.is_empty() { return }
        match self.layers.entry(layer.to_string()).or_insert_with(|| Layer::Polygons(Vec::new())) {
            Layer::Polygons(v) => v.push((id.to_string(), mp.clone())),
            _ => warn!("[shapelog] layer {layer} does not hold polygons"),
        }
    }

    /// Write every non-empty layer to `<dir>/<layer>.shp` and return the
    /// written paths.
    pub fn close(self) -> Result<Vec<PathBuf>> {
        let Some(dir) = self.dir else { return Ok(Vec::new()) };
        fs::create_dir_all(&dir).with_context(|| format!("create dir {}", dir.display()))?;

        let mut written = Vec::new();
        for (name, layer) in &self.layers {
            if layer.len() == 0 { continue }
            let path = dir.join(format!("{name}.shp"));
            write_layer(&path, layer).with_context(|| format!("write shape log {}", path.display()))?;
            debug!("[shapelog] {} features -> {}", layer.len(), path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn write_layer(path: &Path, layer: &Layer) -> Result<()> {
    let field = FieldName::try_from(ID_FIELD).map_err(|e| anyhow!("invalid field name {ID_FIELD}: {e:?}"))?;
    let table = TableWriterBuilder::new().add_character_field(field, ID_FIELD_LENGTH);
    let mut writer = shp::Writer::from_path(path, table)?;

    let record = |id: &str| {
        let mut record = Record::default();
        record.insert(ID_FIELD.to_string(), FieldValue::Character(Some(id.to_string())));
        record
    };

    match layer {
        Layer::Points(points) => for (id, c) in points {
            writer.write_shape_and_record(&shp::Point { x: c.x, y: c.y }, &record(id))?;
        },
        Layer::Lines(lines) => for (id, ls) in lines {
            writer.write_shape_and_record(&geo_line_to_shp(ls), &record(id))?;
        },
        Layer::Polygons(polygons) => for (id, mp) in polygons {
            writer.write_shape_and_record(&geo_to_shp(mp), &record(id))?;
        },
    }
    Ok(())
}

fn geo_line_to_shp(ls: &LineString<f64>) -> shp::Polyline {
    shp::Polyline::new(ls.coords().map(|c| shp::Point { x: c.x, y: c.y }).collect())
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon
fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    /// Close a ring of shapefile::Point
    fn ensure_closed(pts: &mut Vec<shp::Point>) {
        if let (Some(&first), Some(last)) = (pts.first(), pts.last()) {
            if first.x != last.x || first.y != last.y { pts.push(first) }
        }
    }

    /// Signed area of a shapefile::Point ring (negative when clockwise)
    fn signed_area(pts: &[shp::Point]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    let ring = |ls: &LineString<f64>, clockwise: bool| {
        let mut pts: Vec<shp::Point> = ls.coords().map(|c| shp::Point { x: c.x, y: c.y }).collect();
        ensure_closed(&mut pts);
        if (signed_area(&pts) > 0.0) == clockwise { pts.reverse() }
        pts
    };

    // Shapefile ordering: [ext CW, hole CCW, ..., next ext CW, ...]
    let mut rings: Vec<shp::PolygonRing<shp::Point>> = Vec::new();
    for poly in &mp.0 {
        rings.push(shp::PolygonRing::Outer(ring(poly.exterior(), true)));
        for hole in poly.interiors() {
            rings.push(shp::PolygonRing::Inner(ring(hole, false)));
        }
    }
    shp::Polygon::with_rings(rings)
}
