use geo::{Coord, Distance, Euclidean, LineString};

/// Closest point to `p` on segment `a`-`b` and its clamped abscissa in `[0, 1]`.
pub fn closest_on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> (Coord<f64>, f64) {
    let d = b - a;
    let len2 = d.x * d.x + d.y * d.y;
    if len2 == 0.0 { return (a, 0.0) }

    let t = (((p.x - a.x) * d.x + (p.y - a.y) * d.y) / len2).clamp(0.0, 1.0);
    if t == 0.0 { return (a, 0.0) }
    if t == 1.0 { return (b, 1.0) }
    (Coord { x: a.x + t * d.x, y: a.y + t * d.y }, t)
}

/// Nearest location on a linestring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineLocation {
    pub segment: usize,
    pub fraction: f64,
    pub point: Coord<f64>,
    pub distance: f64,
}

/// Nearest location of `p` on `line`; the first segment wins on ties.
pub fn locate_on_line(line: &LineString<f64>, p: Coord<f64>) -> Option<LineLocation> {
    let mut best: Option<LineLocation> = None;
    for (segment, pair) in line.0.windows(2).enumerate() {
        let (point, fraction) = closest_on_segment(p, pair[0], pair[1]);
        let distance = Euclidean.distance(p, point);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(LineLocation { segment, fraction, point, distance });
        }
    }
    best
}

/// Projection of `p` on `line` when it lies within `max_distance`.
pub fn project_on_line(line: &LineString<f64>, p: Coord<f64>, max_distance: f64) -> Option<Coord<f64>> {
    locate_on_line(line, p).filter(|loc| loc.distance <= max_distance).map(|loc| loc.point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn clamps_to_segment_ends() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 4.0, y: 0.0 };
        assert_eq!(closest_on_segment(Coord { x: -3.0, y: 1.0 }, a, b), (a, 0.0));
        assert_eq!(closest_on_segment(Coord { x: 9.0, y: 1.0 }, a, b), (b, 1.0));
        assert_eq!(closest_on_segment(Coord { x: 1.0, y: 2.0 }, a, b), (Coord { x: 1.0, y: 0.0 }, 0.25));
    }

    #[test]
    fn projection_respects_max_distance() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)];
        assert_eq!(project_on_line(&line, Coord { x: 9.0, y: 5.0 }, 2.0), Some(Coord { x: 10.0, y: 5.0 }));
        assert_eq!(project_on_line(&line, Coord { x: 5.0, y: 5.0 }, 2.0), None);
        assert_eq!(locate_on_line(&line, Coord { x: 9.0, y: 5.0 }).unwrap().segment, 1);
    }
}
