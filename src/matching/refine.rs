//! Insertion of reference line endpoints into AU rings.
//!
//! Paths over the landmask may end in the middle of a landmask segment. The
//! touch classifier only tests vertices, so those endpoints are inserted as
//! ring vertices before classification.

use geo::{BoundingRect, Coord, LineString, MultiPolygon};

use crate::geom::{contains_coord, expand};
use crate::geom::project::closest_on_segment;

#[inline]
fn squared(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = a - b;
    d.x * d.x + d.y * d.y
}

/// Insert `point` in the first segment of `line` passing within `precision`,
/// unless an endpoint of that segment already lies within `precision`.
pub fn refine(line: &mut LineString<f64>, point: Coord<f64>, precision: f64) -> bool {
    let p2 = precision * precision;
    for i in 0..line.0.len().saturating_sub(1) {
        let (a, b) = (line.0[i], line.0[i + 1]);
        let (proj, _) = closest_on_segment(point, a, b);
        if squared(point, proj) >= p2 { continue }
        if squared(point, a) < p2 || squared(point, b) < p2 { return false }
        line.0.insert(i + 1, point);
        return true;
    }
    false
}

fn near_ring(ring: &LineString<f64>, point: Coord<f64>, precision: f64) -> bool {
    let p2 = precision * precision;
    ring.lines().any(|l| squared(point, closest_on_segment(point, l.start, l.end).0) < p2)
}

/// Refine the first ring passing near each endpoint of every open line.
/// Returns the number of inserted vertices.
pub fn refine_area_with_ls_endings(lines: &[LineString<f64>], mp: &mut MultiPolygon<f64>, precision: f64) -> usize {
    let Some(reach) = mp.bounding_rect().map(|r| expand(&r, precision)) else { return 0 };

    let mut inserted = 0;
    for line in lines.iter().filter(|l| !l.is_closed()) {
        let (Some(&first), Some(&last)) = (line.0.first(), line.0.last()) else { continue };
        for point in [first, last] {
            if !contains_coord(&reach, point) { continue }
            if refine_first_ring(mp, point, precision) { inserted += 1 }
        }
    }
    inserted
}

fn refine_first_ring(mp: &mut MultiPolygon<f64>, point: Coord<f64>, precision: f64) -> bool {
    for polygon in mp.0.iter_mut() {
        if near_ring(polygon.exterior(), point, precision) {
            let mut done = false;
            polygon.exterior_mut(|ring| done = refine(ring, point, precision));
            return done;
        }
        if let Some(k) = polygon.interiors().iter().position(|ring| near_ring(ring, point, precision)) {
            let mut done = false;
            polygon.interiors_mut(|rings| done = refine(&mut rings[k], point, precision));
            return done;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};

    #[test]
    fn inserts_inside_a_segment() {
        let mut ring = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)];
        assert!(refine(&mut ring, Coord { x: 4.0, y: 0.05 }, 0.1));
        assert_eq!(ring.0[1], Coord { x: 4.0, y: 0.05 });
        assert_eq!(ring.0.len(), 5);
    }

    #[test]
    fn skips_existing_vertices() {
        let mut ring = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 0.0)];
        assert!(!refine(&mut ring, Coord { x: 10.0, y: 0.05 }, 0.1));
        assert_eq!(ring.0.len(), 4);
    }

    #[test]
    fn only_open_lines_refine() {
        let mut mp = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)]]);
        let open = line_string![(x: 5.0, y: -3.0), (x: 5.0, y: 0.0)];
        let closed = line_string![(x: 0.0, y: 5.0), (x: -3.0, y: 5.0), (x: -3.0, y: 6.0), (x: 0.0, y: 5.0)];
        assert_eq!(refine_area_with_ls_endings(&[open, closed], &mut mp, 0.1), 1);
        assert_eq!(mp.0[0].exterior().0[1], Coord { x: 5.0, y: 0.0 });
        assert_eq!(mp.0[0].exterior().0.len(), 6);
    }
}
