use geo::LineString;
use segindex::IndexedGeometry;

/// Directed Hausdorff distance from the vertices of `from` to the indexed
/// geometry, or `None` as soon as one vertex is farther than `max_distance`.
pub fn directed_hausdorff(from: &LineString<f64>, to: &dyn IndexedGeometry, max_distance: f64) -> Option<f64> {
    let mut worst = 0.0_f64;
    for c in from.coords() {
        let hit = to.nearest_distance(c, max_distance)?;
        worst = worst.max(hit.distance);
    }
    Some(worst)
}
