use std::cmp::Ordering;

use geo::algorithm::Validation;
use geo::{Area, Contains, InteriorPoint, LineString, MultiPolygon, Polygon};

/// Assembles closed rings into polygons, nesting holes by containment.
///
/// Rings are placed from the largest to the smallest. Each ring's parent is
/// the smallest already-placed ring containing its interior point; rings at
/// even depth become shells and rings at odd depth become holes of their
/// parent.
#[derive(Debug, Default)]
pub struct PolygonBuilder {
    rings: Vec<LineString<f64>>,
}

impl PolygonBuilder {
    pub fn new() -> Self { Self::default() }

    /// Add a ring, closing it if needed. Rings with fewer than three distinct
    /// vertices are ignored.
    pub fn add_ring(&mut self, mut ring: LineString<f64>) {
        ring.close();
        if ring.0.len() >= 4 { self.rings.push(ring) }
    }

    #[inline]
    pub fn len(&self) -> usize { self.rings.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.rings.is_empty() }

    pub fn build(self) -> MultiPolygon<f64> {
        let faces: Vec<Polygon<f64>> = self.rings
            .into_iter()
            .map(|ring| Polygon::new(ring, vec![]))
            .collect();

        let mut order: Vec<usize> = (0..faces.len()).collect();
        order.sort_by(|&a, &b| {
            faces[b].unsigned_area().partial_cmp(&faces[a].unsigned_area()).unwrap_or(Ordering::Equal)
        });

        // (depth, output polygon) per placed ring, in placement order.
        let mut placed: Vec<(usize, usize, usize)> = Vec::with_capacity(faces.len());
        let mut shells: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

        for &i in &order {
            let inside = faces[i].interior_point();
            let parent = placed.iter().rev().find(|&&(j, _, _)| {
                inside.is_some_and(|pt| faces[j].contains(&pt))
            });

            let depth = parent.map_or(0, |&(_, d, _)| d + 1);
            let ring = faces[i].exterior().clone();
            if depth % 2 == 0 {
                shells.push((ring, Vec::new()));
                placed.push((i, depth, shells.len() - 1));
            } else if let Some(&(_, _, shell)) = parent {
                shells[shell].1.push(ring);
                placed.push((i, depth, shell));
            }
        }

        MultiPolygon::new(shells.into_iter().map(|(shell, holes)| Polygon::new(shell, holes)).collect())
    }
}

/// OGC validity of an assembled result.
#[inline]
pub fn is_valid(mp: &MultiPolygon<f64>) -> bool { mp.is_valid() }

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn square(x0: f64, y0: f64, size: f64) -> LineString<f64> {
        line_string![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size), (x: x0, y: y0),
        ]
    }

    #[test]
    fn nests_holes_and_islands() {
        let mut builder = PolygonBuilder::new();
        builder.add_ring(square(4.0, 4.0, 2.0));
        builder.add_ring(square(0.0, 0.0, 10.0));
        builder.add_ring(square(2.0, 2.0, 6.0));
        builder.add_ring(square(20.0, 0.0, 1.0));

        let mp = builder.build();
        assert_eq!(mp.0.len(), 3);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_eq!(mp.0[0].exterior(), &square(0.0, 0.0, 10.0));
        assert_eq!(mp.0[1].exterior(), &square(4.0, 4.0, 2.0));
        assert!(mp.0[1].interiors().is_empty());
        assert!(is_valid(&mp));
    }

    #[test]
    fn degenerate_rings_are_ignored() {
        let mut builder = PolygonBuilder::new();
        builder.add_ring(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        assert!(builder.is_empty());
        assert!(builder.build().0.is_empty());
    }
}
