//! Salient angles and sharp-corner relocation of gap endpoints.
//!
//! A gap endpoint lying on a sharp landmask corner is moved onto the boundary
//! network vertex whose corner looks most alike, instead of whatever point a
//! plain projection would pick.

use geo::{Coord, Distance, Euclidean, LineString};
use segindex::IndexedGeometry;

use crate::geom::angle::{angle_at_vertex, is_nearly_straight};
use crate::geom::project::{closest_on_segment, project_on_line};
use crate::geom::{envelope_around, LineSplitter};
use crate::network::BoundaryNetwork;

/// Half-width of the box used to find the segments incident to a vertex.
pub const ANGLE_BOX_EPS: f64 = 1e-5;

/// Tolerance of the splitter cutting gaps at relocated endpoints.
pub const SPLIT_TOLERANCE: f64 = 1e-5;

const STRAIGHT_TOLERANCE_DEG: f64 = 10.0;

/// `(upper bound of the angular difference in degrees, score)`, tightest first.
const SCORE_BANDS: [(f64, f64); 5] = [(10.0, 10.0), (15.0, 8.0), (30.0, 5.0), (45.0, 2.0), (60.0, 1.0)];

/// Angle at `point` between the two indexed segments meeting there, or
/// `None` when the point is not a two-segment vertex or the corner is nearly
/// straight.
pub fn angle_at(index: &dyn IndexedGeometry, point: Coord<f64>) -> Option<f64> {
    let segments = index.segments_in_box(&envelope_around(point, ANGLE_BOX_EPS));
    let [first, second] = segments.as_slice() else { return None };

    let far = |a: Coord<f64>, b: Coord<f64>| {
        if Euclidean.distance(point, a) >= Euclidean.distance(point, b) { a } else { b }
    };
    let angle = angle_at_vertex(point, far(first.start, first.end), far(second.start, second.end));
    (!is_nearly_straight(angle, STRAIGHT_TOLERANCE_DEG.to_radians())).then_some(angle)
}

/// Salient angles at both ends of a gap.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EndAngles {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl EndAngles {
    #[inline]
    pub fn is_empty(&self) -> bool { self.start.is_none() && self.end.is_none() }
}

pub fn angle_features(index: &dyn IndexedGeometry, gaps: &[LineString<f64>]) -> Vec<EndAngles> {
    gaps.iter()
        .map(|gap| EndAngles {
            start: gap.0.first().and_then(|&c| angle_at(index, c)),
            end: gap.0.last().and_then(|&c| angle_at(index, c)),
        })
        .collect()
}

/// Similarity of `angle` to `target`, weighted down with `distance`.
/// Differences of 60° or more are rejected.
pub fn score(target: f64, angle: f64, distance: f64) -> Option<f64> {
    let delta = (target - angle).abs().to_degrees();
    let (_, band) = SCORE_BANDS.iter().find(|&&(bound, _)| delta < bound)?;
    Some(band / (1.0 + distance))
}

/// Best-scoring interior vertex of `line`, searching forward from `start`
/// then backward from `start - 1`, each direction stopping at the first
/// vertex farther than `search` from `reference`. Ties keep the forward hit.
pub fn find_index(
    line: &LineString<f64>,
    start: usize,
    reference: Coord<f64>,
    target: f64,
    search: f64,
) -> Option<(usize, f64)> {
    let n = line.0.len();
    if n < 3 { return None }

    let mut best: Option<(usize, f64)> = None;
    let mut visit = |i: usize| -> bool {
        let c = line.0[i];
        let distance = Euclidean.distance(c, reference);
        if distance > search { return false }
        if i == 0 || i == n - 1 { return true }

        let angle = angle_at_vertex(c, line.0[i - 1], line.0[i + 1]);
        if let Some(s) = score(target, angle, distance) {
            if best.is_none_or(|(_, b)| s > b) { best = Some((i, s)) }
        }
        true
    };

    for i in start.min(n - 1)..n {
        if !visit(i) { break }
    }
    for i in (0..start.min(n)).rev() {
        if !visit(i) { break }
    }
    best
}

/// Network vertex within `vertex_search` of the projection of `point`
/// whose corner best matches `target`.
pub fn find_candidate(
    network: &dyn BoundaryNetwork,
    point: Coord<f64>,
    target: f64,
    search: f64,
    vertex_search: f64,
) -> Option<Coord<f64>> {
    let projected = network.project(point, search, None)?;
    let local = network.local(&envelope_around(point, search));

    for line in local.iter() {
        for (j, pair) in line.0.windows(2).enumerate() {
            let (on_segment, t) = closest_on_segment(projected, pair[0], pair[1]);
            if Euclidean.distance(on_segment, projected) > ANGLE_BOX_EPS { continue }

            let start = if t > 0.5 { j + 1 } else { j };
            return find_index(line, start, projected, target, vertex_search).map(|(i, _)| line.0[i]);
        }
    }
    None
}

/// Relocate the salient endpoints of every gap onto matching network
/// corners, trimming each gap at the relocated position. Returns the
/// relocated points.
pub fn find_angles(
    network: &dyn BoundaryNetwork,
    gaps: &mut [LineString<f64>],
    features: &[EndAngles],
    search: f64,
    vertex_snap: f64,
) -> Vec<Coord<f64>> {
    let mut relocated = Vec::new();

    for (gap, feature) in gaps.iter_mut().zip(features) {
        let (Some(&first), Some(&last)) = (gap.0.first(), gap.0.last()) else { continue };
        let start = feature.start.and_then(|angle| find_candidate(network, first, angle, search, vertex_snap));
        let end = feature.end.and_then(|angle| find_candidate(network, last, angle, search, vertex_snap));
        if start.is_none() && end.is_none() { continue }

        let mut trimmed = {
            let mut splitter = LineSplitter::new(gap, SPLIT_TOLERANCE);
            let mut cut_at = |candidate: Option<Coord<f64>>, fallback: Coord<f64>| match candidate {
                Some(c) => splitter.add_cutting_point(project_on_line(gap, c, vertex_snap).unwrap_or(c)),
                None => splitter.add_cutting_point(fallback),
            };
            cut_at(start, first);
            cut_at(end, last);
            splitter.trunc_at_ends()
        };

        let n = trimmed.0.len();
        if let Some(c) = start {
            trimmed.0[0] = c;
            relocated.push(c);
        }
        if let Some(c) = end {
            trimmed.0[n - 1] = c;
            relocated.push(c);
        }
        *gap = trimmed;
    }
    relocated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LineNetwork;
    use approx::assert_relative_eq;
    use geo::line_string;
    use segindex::SegmentIndex;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn right_corner_is_salient() {
        let index = SegmentIndex::from_line_string(&line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)]);
        assert_relative_eq!(angle_at(&index, Coord { x: 10.0, y: 0.0 }).unwrap(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn straight_or_junction_is_not_salient() {
        let straight = SegmentIndex::from_line_string(&line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 20.0, y: 0.5)]);
        assert_eq!(angle_at(&straight, Coord { x: 10.0, y: 0.0 }), None);

        let a = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)];
        let b = line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0)];
        let c = line_string![(x: 10.0, y: 0.0), (x: 20.0, y: -5.0)];
        let junction = SegmentIndex::from_line_strings([&a, &b, &c]);
        assert_eq!(angle_at(&junction, Coord { x: 10.0, y: 0.0 }), None);
    }

    #[test]
    fn score_is_monotonic_in_the_angular_difference() {
        let target = FRAC_PI_2;
        let mut previous = f64::INFINITY;
        for degrees in 0..90 {
            let angle = target + (degrees as f64).to_radians();
            let s = score(target, angle, 2.0).unwrap_or(0.0);
            assert!(s <= previous);
            previous = s;
        }
        assert_eq!(score(target, target + 60.5f64.to_radians(), 0.0), None);
        assert_eq!(score(target, target - 75f64.to_radians(), 0.0), None);
        assert_eq!(score(target, target, 0.0), Some(10.0));
        assert_eq!(score(target, target, 1.0), Some(5.0));
    }

    #[test]
    fn forward_hit_wins_ties() {
        // Identical right corners, all at the same distance from the reference.
        let line = line_string![(x: -4.0, y: 2.0), (x: -2.0, y: 0.0), (x: 0.0, y: 2.0), (x: 2.0, y: 0.0), (x: 4.0, y: 2.0)];
        let (i, _) = find_index(&line, 3, Coord { x: 0.0, y: 0.0 }, FRAC_PI_2, 10.0).unwrap();
        assert_eq!(i, 3);
        let (i, _) = find_index(&line, 1, Coord { x: 0.0, y: 0.0 }, FRAC_PI_2, 10.0).unwrap();
        assert_eq!(i, 1);
    }

    #[test]
    fn search_stops_beyond_range() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 5.0, y: 5.0), (x: 6.0, y: 5.0)];
        assert_eq!(find_index(&line, 0, Coord { x: 0.0, y: 0.0 }, FRAC_PI_2, 4.0), None);
        assert_eq!(find_index(&line, 0, Coord { x: 0.0, y: 0.0 }, FRAC_PI_2, 6.0).map(|(i, _)| i), Some(1));
        assert_eq!(find_index(&line, 0, Coord { x: 0.0, y: 0.0 }, PI, 10.0), None);
    }

    fn l_network() -> LineNetwork {
        let l = line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 5.0), (x: 10.0, y: 10.0)];
        LineNetwork::new([&l])
    }

    #[test]
    fn candidate_is_the_matching_corner() {
        let found = find_candidate(&l_network(), Coord { x: 9.0, y: 0.5 }, FRAC_PI_2, 5.0, 5.0);
        assert_eq!(found, Some(Coord { x: 10.0, y: 0.0 }));
    }

    #[test]
    fn no_candidate_when_nothing_projects() {
        assert_eq!(find_candidate(&l_network(), Coord { x: 30.0, y: 30.0 }, FRAC_PI_2, 5.0, 5.0), None);
    }

    #[test]
    fn gap_end_moves_to_the_corner() {
        let mut gaps = vec![line_string![(x: 9.0, y: 10.0), (x: 9.0, y: 0.5)]];
        let features = [EndAngles { start: None, end: Some(FRAC_PI_2) }];
        let relocated = find_angles(&l_network(), &mut gaps, &features, 5.0, 1.0);
        assert_eq!(relocated, vec![Coord { x: 10.0, y: 0.0 }]);
        assert_eq!(gaps[0], line_string![(x: 9.0, y: 10.0), (x: 10.0, y: 0.0)]);
    }
}
