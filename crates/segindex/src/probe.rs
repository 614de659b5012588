use geo::{BoundingRect, Coord, Distance, Euclidean, Line, LineString, Point, Rect};

/// A geometry that can be measured against indexed segments.
pub trait Probe {
    /// Envelope of the probe, `None` when it has no coordinates.
    fn probe_envelope(&self) -> Option<Rect<f64>>;

    fn distance_to_segment(&self, segment: &Line<f64>) -> f64;
}

impl Probe for Coord<f64> {
    fn probe_envelope(&self) -> Option<Rect<f64>> { Some(Rect::new(*self, *self)) }

    fn distance_to_segment(&self, segment: &Line<f64>) -> f64 {
        Euclidean.distance(*self, segment)
    }
}

impl Probe for Point<f64> {
    fn probe_envelope(&self) -> Option<Rect<f64>> { self.0.probe_envelope() }

    fn distance_to_segment(&self, segment: &Line<f64>) -> f64 {
        Euclidean.distance(self, segment)
    }
}

impl Probe for LineString<f64> {
    fn probe_envelope(&self) -> Option<Rect<f64>> { self.bounding_rect() }

    fn distance_to_segment(&self, segment: &Line<f64>) -> f64 {
        Euclidean.distance(segment, self)
    }
}
