//! Reference network collaborator.
//!
//! The matcher only needs four primitives from a boundary or landmask
//! network: projection of a point, the merged lines near a box, and guided
//! or unguided shortest paths. [`LineNetwork`] implements them over an
//! in-memory segment graph.

mod graph;

pub use graph::{LineNetwork, DEFAULT_SEARCH_BUDGET};

use geo::{Coord, LineString, MultiLineString, Rect};

pub trait BoundaryNetwork {
    /// Nearest network location within `search_distance`, moved onto a
    /// network vertex when one lies within `snap_distance` of it.
    fn project(&self, point: Coord<f64>, search_distance: f64, snap_distance: Option<f64>) -> Option<Coord<f64>>;

    /// Network segments intersecting `envelope`, merged into maximal lines.
    fn local(&self, envelope: &Rect<f64>) -> MultiLineString<f64>;

    /// Shortest path between the projections of `from` and `to`, using only
    /// network edges within `max_distance` of `guide`.
    fn path_along(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
        guide: &LineString<f64>,
        max_distance: f64,
        search_distance: f64,
        snap_distance: f64,
    ) -> Option<LineString<f64>>;

    /// Shortest path between the projections of `from` and `to`.
    fn path(&self, from: Coord<f64>, to: Coord<f64>, search_distance: f64, snap_distance: f64) -> Option<LineString<f64>>;
}
