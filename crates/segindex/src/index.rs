//! Segment-level R-tree over one reference geometry.
//!
//! # Storage
//!
//! The index owns a copy of every vertex it was built from in a flat,
//! append-only arena (`points`). Segments refer to their endpoints by
//! [`PointId`] and are addressed by [`SegmentId`]; no reference into the
//! source geometry survives `build`, so the caller is free to drop or mutate
//! it afterwards.

use std::fmt;

use geo::{Coord, Geometry, Line, LineString, Polygon, Rect};
use rstar::{RTree, RTreeObject, AABB};
use thiserror::Error;

use crate::group::GroupSet;
use crate::probe::Probe;

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

macro_rules! idx {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(PointId);
idx!(SegmentId);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("cannot index segments of a {0} geometry")]
    UnsupportedGeometryKind(&'static str),
}

/// Result of a proximity query.
#[derive(Clone, Debug, PartialEq)]
pub struct Nearest {
    pub distance: f64,
    /// Groups reaching `distance`. Always empty for an ungrouped index.
    pub groups: GroupSet,
}

/// Proximity queries shared by a single index and a grouped collection.
pub trait IndexedGeometry {
    /// Minimum distance from `probe` to any indexed segment, when it is no
    /// greater than `threshold`.
    fn nearest_distance(&self, probe: &dyn Probe, threshold: f64) -> Option<Nearest>;

    /// Every indexed segment whose envelope intersects `envelope`.
    fn segments_in_box(&self, envelope: &Rect<f64>) -> Vec<Line<f64>>;
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct SegmentEntry {
    id: SegmentId,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}

#[derive(Clone, Debug)]
pub struct SegmentIndex {
    points: Vec<Coord<f64>>,
    segments: Vec<(PointId, PointId)>,
    tree: RTree<SegmentEntry>,
    envelope: Option<Rect<f64>>,
}

impl SegmentIndex {
    /// Index the segments of a linear or areal geometry.
    pub fn build(geometry: &Geometry<f64>) -> Result<Self, IndexError> {
        let mut builder = Builder::default();
        match geometry {
            Geometry::LineString(ls) => builder.push_line(ls),
            Geometry::MultiLineString(mls) => mls.iter().for_each(|ls| builder.push_line(ls)),
            Geometry::Polygon(polygon) => builder.push_polygon(polygon),
            Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| builder.push_polygon(p)),
            other => return Err(IndexError::UnsupportedGeometryKind(geometry_kind(other))),
        }
        Ok(builder.finish())
    }

    pub fn from_line_string(line: &LineString<f64>) -> Self {
        let mut builder = Builder::default();
        builder.push_line(line);
        builder.finish()
    }

    pub fn from_line_strings<'a>(lines: impl IntoIterator<Item = &'a LineString<f64>>) -> Self {
        let mut builder = Builder::default();
        lines.into_iter().for_each(|ls| builder.push_line(ls));
        builder.finish()
    }

    #[inline]
    pub fn len(&self) -> usize { self.segments.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    /// Bounding box of every indexed vertex.
    #[inline]
    pub fn envelope(&self) -> Option<Rect<f64>> { self.envelope }

    #[inline]
    pub fn point(&self, id: PointId) -> Coord<f64> { self.points[id.0] }

    #[inline]
    pub fn segment(&self, id: SegmentId) -> Line<f64> {
        let (start, end) = self.segments[id.0];
        Line::new(self.point(start), self.point(end))
    }
}

impl IndexedGeometry for SegmentIndex {
    fn nearest_distance(&self, probe: &dyn Probe, threshold: f64) -> Option<Nearest> {
        let rect = probe.probe_envelope()?;
        let (min, max) = (rect.min(), rect.max());
        let query = AABB::from_corners(
            [min.x - threshold, min.y - threshold],
            [max.x + threshold, max.y + threshold],
        );

        let mut best: Option<f64> = None;
        for entry in self.tree.locate_in_envelope_intersecting(&query) {
            let distance = probe.distance_to_segment(&self.segment(entry.id));
            if distance <= threshold && best.is_none_or(|b| distance < b) {
                best = Some(distance);
            }
        }

        best.map(|distance| Nearest { distance, groups: GroupSet::new() })
    }

    fn segments_in_box(&self, envelope: &Rect<f64>) -> Vec<Line<f64>> {
        let query = to_aabb(envelope);
        let mut ids: Vec<SegmentId> = self.tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| self.segment(id)).collect()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Builder {
    points: Vec<Coord<f64>>,
    segments: Vec<(PointId, PointId)>,
    entries: Vec<SegmentEntry>,
    envelope: Option<Rect<f64>>,
}

impl Builder {
    fn push_line(&mut self, line: &LineString<f64>) {
        let first = self.points.len();
        for &c in line.coords() {
            self.points.push(c);
            self.envelope = Some(match self.envelope {
                None => Rect::new(c, c),
                Some(r) => Rect::new(
                    Coord { x: r.min().x.min(c.x), y: r.min().y.min(c.y) },
                    Coord { x: r.max().x.max(c.x), y: r.max().y.max(c.y) },
                ),
            });
        }
        for i in first..self.points.len().saturating_sub(1) {
            let (a, b) = (self.points[i], self.points[i + 1]);
            let id = SegmentId(self.segments.len());
            self.segments.push((PointId(i), PointId(i + 1)));
            self.entries.push(SegmentEntry {
                id,
                envelope: AABB::from_corners([a.x, a.y], [b.x, b.y]),
            });
        }
    }

    fn push_polygon(&mut self, polygon: &Polygon<f64>) {
        self.push_line(polygon.exterior());
        polygon.interiors().iter().for_each(|ring| self.push_line(ring));
    }

    fn finish(self) -> SegmentIndex {
        SegmentIndex {
            points: self.points,
            segments: self.segments,
            tree: RTree::bulk_load(self.entries),
            envelope: self.envelope,
        }
    }
}

pub(crate) fn to_aabb(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    let (min, max) = (rect.min(), rect.max());
    AABB::from_corners([min.x, min.y], [max.x, max.y])
}

pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
