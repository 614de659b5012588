use geo::{BoundingRect, LineString, Rect};
use rstar::{RTree, RTreeObject, AABB};
use segindex::{IndexedGeometry, SegmentIndex};

use crate::geom::{directed_hausdorff, expand};

/// A closed boundary's envelope in the R-tree, pointing back at the line.
#[derive(Debug, Clone)]
struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Closed reference boundary lines, searchable by shape.
pub struct ClosedBoundaries {
    lines: Vec<LineString<f64>>,
    indexes: Vec<SegmentIndex>,
    rtree: RTree<BoundingBox>,
}

impl ClosedBoundaries {
    /// Keep the closed lines of `lines`.
    pub fn new(lines: impl IntoIterator<Item = LineString<f64>>) -> Self {
        let lines: Vec<LineString<f64>> = lines.into_iter()
            .filter(|l| l.0.len() >= 4 && l.is_closed())
            .collect();
        let indexes = lines.iter().map(SegmentIndex::from_line_string).collect();
        let rtree = RTree::bulk_load(
            lines.iter()
                .enumerate()
                .filter_map(|(idx, l)| l.bounding_rect().map(|bbox| BoundingBox { idx, bbox }))
                .collect(),
        );
        Self { lines, indexes, rtree }
    }

    #[inline]
    pub fn len(&self) -> usize { self.lines.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    #[inline]
    pub fn line(&self, idx: usize) -> &LineString<f64> { &self.lines[idx] }

    /// Boundaries within directed Hausdorff distance `max_distance` of
    /// `ring`, measured from the ring or, failing that, from the boundary.
    pub fn find(&self, ring: &LineString<f64>, max_distance: f64) -> Vec<usize> {
        let Some(bbox) = ring.bounding_rect() else { return Vec::new() };
        let query = expand(&bbox, max_distance);
        let query = AABB::from_corners(query.min().into(), query.max().into());

        let mut ring_index: Option<SegmentIndex> = None;
        let mut found: Vec<usize> = Vec::new();
        for candidate in self.rtree.locate_in_envelope_intersecting(&query) {
            let idx = candidate.idx;
            let index = &self.indexes[idx];
            if index.nearest_distance(ring, max_distance).is_none() { continue }

            if directed_hausdorff(ring, index, max_distance).is_some() {
                found.push(idx);
                continue;
            }
            let ring_index = ring_index.get_or_insert_with(|| SegmentIndex::from_line_string(ring));
            if directed_hausdorff(&self.lines[idx], ring_index, max_distance).is_some() {
                found.push(idx);
            }
        }
        found.sort_unstable();
        found
    }
}
