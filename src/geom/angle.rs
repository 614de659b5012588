use std::f64::consts::PI;

use geo::Coord;

/// Unsigned angle in `[0, π]` between vectors `u` and `v`.
#[inline]
pub fn angle_between(u: Coord<f64>, v: Coord<f64>) -> f64 {
    let cross = u.x * v.y - u.y * v.x;
    let dot = u.x * v.x + u.y * v.y;
    cross.abs().atan2(dot)
}

/// Angle at `vertex` between the rays towards `a` and `b`.
#[inline]
pub fn angle_at_vertex(vertex: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    angle_between(a - vertex, b - vertex)
}

/// Whether `angle` is within `tolerance` of a straight angle.
#[inline]
pub fn is_nearly_straight(angle: f64, tolerance: f64) -> bool {
    (angle - PI).abs() < tolerance
}
