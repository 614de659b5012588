use std::cmp::Ordering;

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{BoundingRect, Coord, Distance, Euclidean, Intersects, Length, Line, LineString};

use crate::geom::project::{closest_on_segment, locate_on_line};

/// A cut position on the split line.
#[derive(Clone, Copy, Debug)]
struct Cut {
    segment: usize,
    fraction: f64,
    point: Coord<f64>,
}

impl Cut {
    fn cmp_position(&self, other: &Self) -> Ordering {
        self.segment.cmp(&other.segment)
            .then_with(|| self.fraction.partial_cmp(&other.fraction).unwrap_or(Ordering::Equal))
    }
}

/// Cuts a linestring at points and at crossings with other lines, and
/// truncates it to the piece lying between the outermost cuts.
pub struct LineSplitter<'a> {
    line: &'a LineString<f64>,
    tolerance: f64,
    cuts: Vec<Cut>,
}

impl<'a> LineSplitter<'a> {
    pub fn new(line: &'a LineString<f64>, tolerance: f64) -> Self {
        Self { line, tolerance, cuts: Vec::new() }
    }

    #[inline]
    pub fn num_cuts(&self) -> usize { self.cuts.len() }

    /// Cut at `point` when it lies within tolerance of the line.
    pub fn add_cutting_point(&mut self, point: Coord<f64>) -> bool {
        match locate_on_line(self.line, point) {
            Some(loc) if loc.distance <= self.tolerance => {
                self.push(loc.segment, loc.fraction, point);
                true
            }
            _ => false,
        }
    }

    /// Cut wherever the line crosses one of `cutters`.
    pub fn add_cutting_lines<'b>(&mut self, cutters: impl IntoIterator<Item = &'b LineString<f64>>) {
        for cutter in cutters {
            let Some(cutter_box) = cutter.bounding_rect() else { continue };
            if !self.line.bounding_rect().is_some_and(|r| r.intersects(&cutter_box)) { continue }

            for (segment, pair) in self.line.0.windows(2).enumerate() {
                let own = Line::new(pair[0], pair[1]);
                for other in cutter.lines() {
                    match line_intersection(own, other) {
                        Some(LineIntersection::SinglePoint { intersection, .. }) => {
                            self.push_on_segment(segment, intersection);
                        }
                        Some(LineIntersection::Collinear { intersection }) => {
                            self.push_on_segment(segment, intersection.start);
                            self.push_on_segment(segment, intersection.end);
                        }
                        None => {}
                    }
                }
            }
        }
    }

    fn push_on_segment(&mut self, segment: usize, point: Coord<f64>) {
        let (a, b) = (self.line.0[segment], self.line.0[segment + 1]);
        let (_, fraction) = closest_on_segment(point, a, b);
        self.push(segment, fraction, point);
    }

    /// Record a cut, snapping it to a line vertex within tolerance.
    fn push(&mut self, segment: usize, fraction: f64, point: Coord<f64>) {
        let last_segment = self.line.0.len() - 2;
        let (a, b) = (self.line.0[segment], self.line.0[segment + 1]);
        let cut = if Euclidean.distance(point, a) <= self.tolerance {
            Cut { segment, fraction: 0.0, point: a }
        } else if Euclidean.distance(point, b) <= self.tolerance {
            if segment == last_segment {
                Cut { segment, fraction: 1.0, point: b }
            } else {
                Cut { segment: segment + 1, fraction: 0.0, point: b }
            }
        } else {
            Cut { segment, fraction, point }
        };
        self.cuts.push(cut);
    }

    fn abscissa(&self, cut: &Cut) -> f64 {
        let before: f64 = self.line.lines().take(cut.segment).map(|l| Euclidean.length(&l)).sum();
        let own = self.line.lines().nth(cut.segment).map_or(0.0, |l| Euclidean.length(&l));
        before + cut.fraction * own
    }

    /// The piece between the first and last cut. With a single cut, the
    /// shorter end is dropped; without cuts, the line is returned unchanged.
    pub fn trunc_at_ends(&self) -> LineString<f64> {
        if self.line.0.len() < 2 || self.cuts.is_empty() { return self.line.clone() }

        let mut cuts = self.cuts.clone();
        cuts.sort_by(|a, b| a.cmp_position(b));
        cuts.dedup_by(|a, b| a.point == b.point);

        let n = self.line.0.len();
        let head = Cut { segment: 0, fraction: 0.0, point: self.line.0[0] };
        let tail = Cut { segment: n - 2, fraction: 1.0, point: self.line.0[n - 1] };

        let (from, to) = match cuts.as_slice() {
            [only] => {
                let total = self.abscissa(&tail);
                if self.abscissa(only) <= total - self.abscissa(only) { (*only, tail) } else { (head, *only) }
            }
            [first, .., last] => (*first, *last),
            [] => return self.line.clone(),
        };

        let piece = self.between(&from, &to);
        if piece.0.len() < 2 { self.line.clone() } else { piece }
    }

    fn between(&self, from: &Cut, to: &Cut) -> LineString<f64> {
        let mut coords = vec![from.point];
        for k in from.segment + 1..=to.segment {
            if k < to.segment || to.fraction > 0.0 {
                super::push_distinct(&mut coords, self.line.0[k]);
            }
        }
        super::push_distinct(&mut coords, to.point);
        LineString(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn gap() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)]
    }

    #[test]
    fn no_cut_keeps_line() {
        let line = gap();
        assert_eq!(LineSplitter::new(&line, 1e-5).trunc_at_ends(), line);
    }

    #[test]
    fn two_crossings_keep_the_inner_piece() {
        let line = gap();
        let mut splitter = LineSplitter::new(&line, 1e-5);
        let cutter_a = line_string![(x: 2.0, y: -1.0), (x: 2.0, y: 1.0)];
        let cutter_b = line_string![(x: 1.0, y: 9.0), (x: 1.0, y: 11.0)];
        splitter.add_cutting_lines([&cutter_a, &cutter_b]);
        assert_eq!(splitter.num_cuts(), 2);

        let piece = splitter.trunc_at_ends();
        assert_eq!(piece.0.len(), 4);
        assert!(Euclidean.distance(piece.0[0], Coord { x: 2.0, y: 0.0 }) < 1e-9);
        assert_eq!(&piece.0[1..3], &[Coord { x: 10.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 }]);
        assert!(Euclidean.distance(piece.0[3], Coord { x: 1.0, y: 10.0 }) < 1e-9);
    }

    #[test]
    fn single_cut_drops_the_shorter_end() {
        let line = gap();
        let mut splitter = LineSplitter::new(&line, 1e-5);
        assert!(splitter.add_cutting_point(Coord { x: 3.0, y: 0.0 }));
        assert_eq!(
            splitter.trunc_at_ends(),
            line_string![(x: 3.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)]
        );
    }

    #[test]
    fn cuts_snap_to_vertices() {
        let line = gap();
        let mut splitter = LineSplitter::new(&line, 1e-5);
        assert!(splitter.add_cutting_point(Coord { x: 10.0, y: 0.0 }));
        assert!(splitter.add_cutting_point(Coord { x: 10.0, y: 10.0 }));
        assert!(!splitter.add_cutting_point(Coord { x: 5.0, y: 5.0 }));
        assert_eq!(splitter.trunc_at_ends(), line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0)]);
    }
}
