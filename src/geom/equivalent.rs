//! Topological equality of rings and polygons.
//!
//! Two rings are equivalent when they visit the same vertices in the same
//! cyclic order, whatever their start vertex or orientation.

use geo::{Coord, LineString, MultiPolygon, Polygon};

fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    let coords = ring.0.as_slice();
    if ring.is_closed() && !coords.is_empty() { &coords[..coords.len() - 1] } else { coords }
}

pub fn rings_equivalent(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let (a, b) = (open_ring(a), open_ring(b));
    if a.len() != b.len() { return false }
    let n = a.len();
    if n == 0 { return true }

    (0..n).filter(|&k| b[k] == a[0]).any(|k| {
        (0..n).all(|i| a[i] == b[(k + i) % n]) || (0..n).all(|i| a[i] == b[(k + n - i) % n])
    })
}

/// Match every item of `a` to a distinct equivalent item of `b`.
fn matched<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if a.len() != b.len() { return false }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let Some(j) = (0..b.len()).find(|&j| !used[j] && eq(x, &b[j])) else { return false };
        used[j] = true;
        true
    })
}

pub fn polygons_equivalent(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    rings_equivalent(a.exterior(), b.exterior()) && matched(a.interiors(), b.interiors(), rings_equivalent)
}

pub fn multipolygons_equivalent(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    matched(&a.0, &b.0, polygons_equivalent)
}
