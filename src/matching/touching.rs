//! Touch classification of ring segments.
//!
//! A vertex touches when it lies within [`TOUCHING_THRESHOLD`] of the
//! reference index; a segment touches when both its vertices touch and they
//! reach a common group (see [`GroupRule`]). The maximal runs of
//! non-touching segments are the gaps of the ring.

use geo::{Geometry, LineString, Polygon};
use segindex::{Group, GroupSet, IndexError, IndexedGeometry};
use serde::{Deserialize, Serialize};

use crate::error::MatchingError;

pub const TOUCHING_THRESHOLD: f64 = 0.1;

/// How group sets of two touching vertices must overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRule {
    /// Any shared group, the ungrouped sentinel included.
    #[default]
    Lenient,
    /// Only a shared explicit group.
    Strict,
}

/// Two empty sets come from a flat, ungrouped reference and always match.
pub fn common_group_exists(a: &GroupSet, b: &GroupSet, rule: GroupRule) -> bool {
    if a.is_empty() && b.is_empty() { return true }
    match rule {
        GroupRule::Lenient => a.shared(b).next().is_some(),
        GroupRule::Strict => a.shared(b).any(Group::is_explicit),
    }
}

/// Gaps and single-vertex contacts of one linestring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TouchingParts {
    /// Inclusive vertex ranges of the non-touching runs, in walk order.
    pub not_touching: Vec<(usize, usize)>,
    /// Touching vertices whose adjacent segments are all non-touching.
    pub touching_points: Vec<usize>,
}

impl TouchingParts {
    /// Every segment touches.
    #[inline]
    pub fn is_loop(&self) -> bool { self.not_touching.is_empty() }
}

pub fn extract_not_touching_parts(
    index: &dyn IndexedGeometry,
    line: &LineString<f64>,
    rule: GroupRule,
) -> TouchingParts {
    let n = line.0.len();
    if n < 2 { return TouchingParts { not_touching: vec![(0, 0)], touching_points: vec![] } }
    let closed = line.is_closed();
    let n_seg = n - 1;

    let hits: Vec<Option<GroupSet>> = line.coords()
        .map(|c| index.nearest_distance(c, TOUCHING_THRESHOLD).map(|hit| hit.groups))
        .collect();
    let touching: Vec<bool> = (0..n_seg)
        .map(|i| match (&hits[i], &hits[i + 1]) {
            (Some(a), Some(b)) => common_group_exists(a, b, rule),
            _ => false,
        })
        .collect();

    // Ring vertex n-1 repeats vertex 0; the last vertex of an open line is
    // never a contact point.
    let touching_points: Vec<usize> = (0..n_seg)
        .filter(|&v| hits[v].is_some())
        .filter(|&v| {
            let prev = if v > 0 { Some(v - 1) } else if closed { Some(n_seg - 1) } else { None };
            prev.is_none_or(|s| !touching[s]) && !touching[v]
        })
        .collect();

    if touching.iter().all(|&t| !t) {
        return TouchingParts { not_touching: vec![(0, n - 1)], touching_points };
    }

    let mut not_touching = Vec::new();
    let mut run: Option<usize> = None;
    if closed {
        // Start right after a touching segment so no run is split by the seam.
        let first = touching.iter().position(|&t| t).unwrap_or(0);
        for step in 1..=n_seg {
            let i = (first + step) % n_seg;
            if !touching[i] {
                run.get_or_insert(i);
            } else if let Some(start) = run.take() {
                not_touching.push((start, i));
            }
        }
    } else {
        for i in 0..n_seg {
            if !touching[i] {
                run.get_or_insert(i);
            } else if let Some(start) = run.take() {
                not_touching.push((start, i));
            }
        }
        if let Some(start) = run { not_touching.push((start, n - 1)) }
    }

    TouchingParts { not_touching, touching_points }
}

/// Classification mirroring the nesting of the classified geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Parts {
    Vertex(bool),
    Line(TouchingParts),
    Nested(Vec<Parts>),
}

impl Parts {
    /// Line classifications in traversal order.
    pub fn lines(&self) -> Vec<&TouchingParts> {
        match self {
            Parts::Vertex(_) => vec![],
            Parts::Line(parts) => vec![parts],
            Parts::Nested(children) => children.iter().flat_map(Parts::lines).collect(),
        }
    }
}

fn polygon_parts(index: &dyn IndexedGeometry, polygon: &Polygon<f64>, rule: GroupRule) -> Parts {
    Parts::Nested(
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(|ring| Parts::Line(extract_not_touching_parts(index, ring, rule)))
            .collect(),
    )
}

/// Classify every linestring of `geometry`, keeping its nesting: rings per
/// polygon, polygons per multipolygon.
pub fn extract_parts(index: &dyn IndexedGeometry, geometry: &Geometry<f64>, rule: GroupRule) -> Result<Parts, MatchingError> {
    Ok(match geometry {
        Geometry::Point(p) => Parts::Vertex(index.nearest_distance(p, TOUCHING_THRESHOLD).is_some()),
        Geometry::LineString(ls) => Parts::Line(extract_not_touching_parts(index, ls, rule)),
        Geometry::MultiLineString(mls) => Parts::Nested(
            mls.iter().map(|ls| Parts::Line(extract_not_touching_parts(index, ls, rule))).collect(),
        ),
        Geometry::Polygon(polygon) => polygon_parts(index, polygon, rule),
        Geometry::MultiPolygon(mp) => Parts::Nested(mp.iter().map(|p| polygon_parts(index, p, rule)).collect()),
        other => return Err(IndexError::UnsupportedGeometryKind(segindex::index::geometry_kind(other)).into()),
    })
}

/// Ranges between consecutive gaps. For a ring, entry `i` runs from the end
/// of gap `i - 1` to the start of gap `i`.
pub fn touching_parts(not_touching: &[(usize, usize)], n_points: usize, closed: bool) -> Vec<(usize, usize)> {
    let last = n_points.saturating_sub(1);
    if not_touching.is_empty() { return vec![(0, last)] }

    if closed {
        let mut prev = not_touching[not_touching.len() - 1].1;
        return not_touching.iter().map(|&(start, end)| {
            let part = (prev, start);
            prev = end;
            part
        }).collect();
    }

    let mut parts = Vec::new();
    let mut prev = 0;
    for (i, &(start, end)) in not_touching.iter().enumerate() {
        if i > 0 || start > 0 { parts.push((prev, start)) }
        prev = end;
    }
    if prev < last { parts.push((prev, last)) }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, Coord, MultiPolygon};
    use segindex::{SegmentIndex, SegmentIndexCollection};

    fn square() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0), (x: 0.0, y: 0.0)]
    }

    fn reference(line: LineString<f64>) -> SegmentIndex { SegmentIndex::from_line_string(&line) }

    #[test]
    fn group_rules() {
        let empty = GroupSet::new();
        let ungrouped = GroupSet::single(Group::Ungrouped);
        let one = GroupSet::single(Group::Id(1));
        let two = GroupSet::single(Group::Id(2));
        assert!(common_group_exists(&empty, &empty, GroupRule::Strict));
        assert!(common_group_exists(&ungrouped, &ungrouped, GroupRule::Lenient));
        assert!(!common_group_exists(&ungrouped, &ungrouped, GroupRule::Strict));
        assert!(common_group_exists(&one, &one, GroupRule::Strict));
        assert!(!common_group_exists(&one, &two, GroupRule::Lenient));
        assert!(!common_group_exists(&empty, &one, GroupRule::Lenient));
    }

    #[test]
    fn near_edge_leaves_one_gap() {
        let index = reference(line_string![(x: -5.0, y: -0.05), (x: 15.0, y: -0.05)]);
        let parts = extract_not_touching_parts(&index, &square(), GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(1, 0)]);
        assert!(parts.touching_points.is_empty());
    }

    #[test]
    fn wrapping_gap_range() {
        // Touching edge is the top one: segment 2.
        let index = reference(line_string![(x: -5.0, y: 10.05), (x: 15.0, y: 10.05)]);
        let parts = extract_not_touching_parts(&index, &square(), GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(3, 2)]);
    }

    #[test]
    fn fully_touching_ring_is_a_loop() {
        let index = SegmentIndex::build(&Geometry::Polygon(polygon![
            (x: 0.0, y: 0.05), (x: 10.0, y: 0.05), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ])).unwrap();
        let parts = extract_not_touching_parts(&index, &square(), GroupRule::Lenient);
        assert!(parts.is_loop());
        assert!(parts.touching_points.is_empty());
    }

    #[test]
    fn far_ring_is_one_full_range() {
        let index = reference(line_string![(x: 100.0, y: 100.0), (x: 200.0, y: 100.0)]);
        let parts = extract_not_touching_parts(&index, &square(), GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(0, 4)]);
        assert!(parts.touching_points.is_empty());
    }

    #[test]
    fn single_contact_is_an_isolated_point() {
        let index = reference(line_string![(x: -5.0, y: 4.93), (x: 4.93, y: -5.0)]);
        let parts = extract_not_touching_parts(&index, &square(), GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(0, 4)]);
        assert_eq!(parts.touching_points, vec![0]);
    }

    #[test]
    fn tangent_rings_of_distinct_groups_do_not_touch() {
        // The edge joins a corner of each reference square: both ends touch,
        // but through different groups.
        let left = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let right = polygon![(x: 10.0, y: 20.0), (x: 20.0, y: 20.0), (x: 20.0, y: 30.0), (x: 10.0, y: 30.0)];
        let mut collection = SegmentIndexCollection::new();
        collection.add(SegmentIndex::build(&Geometry::Polygon(left)).unwrap(), Group::Id(0));
        collection.add(SegmentIndex::build(&Geometry::Polygon(right)).unwrap(), Group::Id(1));

        let line = line_string![(x: 10.0, y: 10.0), (x: 10.0, y: 20.0)];
        let parts = extract_not_touching_parts(&collection, &line, GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(0, 1)]);
        assert_eq!(parts.touching_points, vec![0]);
    }

    #[test]
    fn open_line_end_is_not_a_contact_point() {
        let index = reference(line_string![(x: 10.0, y: -5.0), (x: 10.0, y: 5.0)]);
        let line = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 3.0), (x: 10.0, y: 0.0)];
        let parts = extract_not_touching_parts(&index, &line, GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(0, 2)]);
        assert!(parts.touching_points.is_empty());

        let reversed = line_string![(x: 10.0, y: 0.0), (x: 5.0, y: 3.0), (x: 0.0, y: 0.0)];
        let parts = extract_not_touching_parts(&index, &reversed, GroupRule::Lenient);
        assert_eq!(parts.touching_points, vec![0]);
    }

    #[test]
    fn open_line_runs() {
        let index = reference(line_string![(x: 2.0, y: 0.0), (x: 4.0, y: 0.0)]);
        let line = line_string![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 3.0, y: 0.0), (x: 4.0, y: 0.0), (x: 6.0, y: 0.0)];
        let parts = extract_not_touching_parts(&index, &line, GroupRule::Lenient);
        assert_eq!(parts.not_touching, vec![(0, 1), (3, 4)]);
        assert_eq!(touching_parts(&parts.not_touching, 5, false), vec![(1, 3)]);
    }

    #[test]
    fn ranges_partition_the_ring() {
        let index = reference(line_string![(x: -5.0, y: -0.05), (x: 15.0, y: -0.05)]);
        let ring = square();
        let parts = extract_not_touching_parts(&index, &ring, GroupRule::Lenient);
        let touching = touching_parts(&parts.not_touching, ring.0.len(), true);
        assert_eq!(touching, vec![(0, 1)]);

        let n_seg = ring.0.len() - 1;
        let mut covered = vec![0; n_seg];
        for &(start, end) in parts.not_touching.iter().chain(&touching) {
            let mut i = start;
            while i != end {
                covered[i] += 1;
                i = (i + 1) % n_seg;
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn nesting_follows_the_geometry() {
        let index = reference(line_string![(x: -5.0, y: -0.05), (x: 15.0, y: -0.05)]);
        let mp = MultiPolygon::new(vec![Polygon::new(square(), vec![])]);
        let parts = extract_parts(&index, &Geometry::MultiPolygon(mp), GroupRule::Lenient).unwrap();
        let Parts::Nested(polygons) = &parts else { panic!("expected nesting") };
        assert_eq!(polygons.len(), 1);
        assert_eq!(parts.lines().len(), 1);

        let vertex = extract_parts(&index, &Geometry::Point(point!(x: 0.0, y: 0.0)), GroupRule::Lenient).unwrap();
        assert_eq!(vertex, Parts::Vertex(true));

        let rect = geo::Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert!(extract_parts(&index, &Geometry::Rect(rect), GroupRule::Lenient).is_err());
    }
}
