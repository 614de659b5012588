//! Planar geometry helpers used by the matcher.

pub mod angle;
pub mod build;
pub mod equivalent;
pub mod hausdorff;
pub mod merge;
pub mod project;
pub mod split;

pub use build::{is_valid, PolygonBuilder};
pub use equivalent::{multipolygons_equivalent, rings_equivalent};
pub use hausdorff::directed_hausdorff;
pub use merge::merge_lines;
pub use split::LineSplitter;

use geo::{Coord, Rect};

/// Push `c` unless it repeats the last coordinate.
#[inline]
pub fn push_distinct(coords: &mut Vec<Coord<f64>>, c: Coord<f64>) {
    if coords.last() != Some(&c) { coords.push(c) }
}

/// Square envelope of half-width `radius` around `c`.
#[inline]
pub fn envelope_around(c: Coord<f64>, radius: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: c.x - radius, y: c.y - radius },
        Coord { x: c.x + radius, y: c.y + radius },
    )
}

/// `rect` grown by `margin` on every side.
#[inline]
pub fn expand(rect: &Rect<f64>, margin: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: rect.min().x - margin, y: rect.min().y - margin },
        Coord { x: rect.max().x + margin, y: rect.max().y + margin },
    )
}

#[inline]
pub fn contains_coord(rect: &Rect<f64>, c: Coord<f64>) -> bool {
    c.x >= rect.min().x && c.x <= rect.max().x && c.y >= rect.min().y && c.y <= rect.max().y
}
