//! Reconstruction of one AU ring against the reference boundary network.
//!
//! A ring is classified against the landmask inland boundary, then either
//! replaced by a closed reference boundary (the whole ring runs along the
//! landmask), kept as is (nothing runs along it) or rebuilt by stitching its
//! gaps together with network paths guided by the touching parts.

use ahash::AHashSet;
use geo::{BoundingRect, Coord, Distance, Euclidean, LineString};
use segindex::IndexedGeometry;
use tracing::{debug, error};

use crate::error::MatchingError;
use crate::geom::{expand, push_distinct, LineSplitter};
use crate::matching::angles::{angle_features, find_angles, SPLIT_TOLERANCE};
use crate::matching::closed::ClosedBoundaries;
use crate::matching::substring::sub_string;
use crate::matching::touching::{extract_not_touching_parts, touching_parts, TouchingParts};
use crate::network::BoundaryNetwork;
use crate::params::Tolerances;
use crate::shapelog::ShapeLogger;

/// Read-only reference data shared by every ring of a run.
#[derive(Clone, Copy)]
pub struct References<'a> {
    /// Landmask boundary without its coastline parts.
    pub no_coast: &'a dyn IndexedGeometry,
    pub network: &'a dyn BoundaryNetwork,
    pub closed_boundaries: &'a ClosedBoundaries,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingCase {
    /// Every segment runs along the landmask inland boundary.
    Loop,
    /// One closed gap: the ring never runs along the landmask.
    Untouched,
    Gaps,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RingOutcome {
    /// Replacement rings. A loop matching an already used boundary yields none.
    Reconstructed { rings: Vec<LineString<f64>>, modified: bool },
    Failed(MatchingError),
}

pub struct RingMatcher<'a> {
    refs: References<'a>,
    tolerances: &'a Tolerances,
}

impl<'a> RingMatcher<'a> {
    pub fn new(refs: References<'a>, tolerances: &'a Tolerances) -> Self {
        Self { refs, tolerances }
    }

    #[inline]
    pub fn references(&self) -> References<'a> { self.refs }

    pub fn classify(&self, ring: &LineString<f64>) -> TouchingParts {
        extract_not_touching_parts(self.refs.no_coast, ring, self.tolerances.group_rule)
    }

    /// Rebuild `ring`. `used_loops` holds the closed boundaries already
    /// emitted for the current AU.
    pub fn reconstruct(
        &self,
        ring: &LineString<f64>,
        au_id: &str,
        used_loops: &mut AHashSet<usize>,
        shapes: &mut ShapeLogger,
    ) -> RingOutcome {
        let parts = self.classify(ring);
        if parts.is_loop() {
            debug!("[ring] {au_id}: {:?} of {} points", RingCase::Loop, ring.0.len());
            return self.match_loop(ring, au_id, used_loops, shapes);
        }

        let ring = self.project_touching_points(ring, &parts.touching_points);
        let mut gaps: Vec<LineString<f64>> = parts.not_touching.iter().map(|&range| sub_string(range, &ring)).collect();

        if let [gap] = gaps.as_slice() {
            if gap.is_closed() {
                debug!("[ring] {au_id}: {:?} with {} contact points", RingCase::Untouched, parts.touching_points.len());
                return RingOutcome::Reconstructed {
                    rings: vec![gap.clone()],
                    modified: !parts.touching_points.is_empty(),
                };
            }
        }
        debug!("[ring] {au_id}: {:?}, {} gaps", RingCase::Gaps, gaps.len());

        for gap in &gaps {
            shapes.line("not_boundaries", au_id, gap);
        }
        for &i in &parts.touching_points {
            shapes.point("contact_points", au_id, ring.0[i]);
        }

        let features = angle_features(self.refs.no_coast, &gaps);
        for gap in gaps.iter_mut() {
            *gap = self.trim(gap, au_id, shapes);
            shapes.line("not_boundaries_trim", au_id, gap);
        }

        let relocated = find_angles(
            self.refs.network,
            &mut gaps,
            &features,
            self.tolerances.boundary_search_dist,
            self.tolerances.boundary_snap_dist,
        );
        for c in relocated {
            shapes.point("projected_point_on_sharp", au_id, c);
        }

        let guides: Vec<LineString<f64>> = touching_parts(&parts.not_touching, ring.0.len(), true)
            .into_iter()
            .map(|range| sub_string(range, &ring))
            .collect();
        if guides.len() != gaps.len() {
            return RingOutcome::Failed(MatchingError::RingConstruction(format!(
                "{} touching parts for {} gaps",
                guides.len(),
                gaps.len()
            )));
        }

        match self.stitch(&gaps, &guides, au_id, shapes) {
            Ok(rebuilt) => {
                for gap in &gaps {
                    shapes.line("not_boundaries_merged", au_id, gap);
                }
                RingOutcome::Reconstructed { rings: vec![rebuilt], modified: true }
            }
            Err(e) => RingOutcome::Failed(e),
        }
    }

    fn match_loop(
        &self,
        ring: &LineString<f64>,
        au_id: &str,
        used_loops: &mut AHashSet<usize>,
        shapes: &mut ShapeLogger,
    ) -> RingOutcome {
        let boundaries = self.refs.closed_boundaries;
        let found = boundaries.find(ring, self.tolerances.boundary_max_dist);
        if found.is_empty() {
            return RingOutcome::Failed(MatchingError::ClosedBoundaryNotFound);
        }

        let mut rings = Vec::new();
        for idx in found {
            if !used_loops.insert(idx) { continue }
            let line = boundaries.line(idx);
            shapes.line("boucle", au_id, line);
            rings.push(line.clone());
        }
        RingOutcome::Reconstructed { rings, modified: true }
    }

    /// Move isolated touching vertices onto the boundary network.
    fn project_touching_points(&self, ring: &LineString<f64>, touching: &[usize]) -> LineString<f64> {
        let mut ring = ring.clone();
        let closed = ring.is_closed();
        for &i in touching {
            let c = ring.0[i];
            match self.refs.network.project(
                c,
                self.tolerances.boundary_search_dist,
                Some(self.tolerances.boundary_snap_dist),
            ) {
                Some(projected) => ring.0[i] = projected,
                None => error!("[ring] {}", MatchingError::TouchingPointNotProjected(c)),
            }
        }
        if closed && touching.contains(&0) {
            let n = ring.0.len();
            ring.0[n - 1] = ring.0[0];
        }
        ring
    }

    /// Cut `gap` where it crosses the local boundary network, keep the piece
    /// between the outermost crossings and drop short moved terminal segments.
    fn trim(&self, gap: &LineString<f64>, au_id: &str, shapes: &mut ShapeLogger) -> LineString<f64> {
        let Some(bbox) = gap.bounding_rect() else { return gap.clone() };
        let local = self.refs.network.local(&expand(&bbox, SPLIT_TOLERANCE));

        let mut splitter = LineSplitter::new(gap, SPLIT_TOLERANCE);
        splitter.add_cutting_lines(local.iter());
        let mut trimmed = splitter.trunc_at_ends();

        let min_length = self.tolerances.segment_min_length;
        let (Some(&first), Some(&last)) = (gap.0.first(), gap.0.last()) else { return trimmed };

        if trimmed.0.len() > 2 && trimmed.0[0] != first && Euclidean.distance(trimmed.0[0], trimmed.0[1]) < min_length {
            shapes.point("deleted_segments", au_id, trimmed.0[1]);
            trimmed.0.remove(1);
        }
        let n = trimmed.0.len();
        if n > 2 && trimmed.0[n - 1] != last && Euclidean.distance(trimmed.0[n - 1], trimmed.0[n - 2]) < min_length {
            shapes.point("deleted_segments", au_id, trimmed.0[n - 2]);
            trimmed.0.remove(n - 2);
        }
        trimmed
    }

    /// Guided path between two gap ends, widening the corridor on failure.
    fn path_with_retry(&self, from: Coord<f64>, to: Coord<f64>, guide: &LineString<f64>) -> Option<LineString<f64>> {
        let t = self.tolerances;
        let mut max_distance = t.boundary_search_dist;
        for attempt in 0..=t.path_retries {
            if attempt > 0 {
                max_distance *= 2.0;
                debug!("[ring] retrying path with corridor {max_distance}");
            }
            let path = self.refs.network.path_along(
                from,
                to,
                guide,
                max_distance,
                t.boundary_search_dist,
                t.boundary_snap_dist,
            );
            if path.is_some() { return path }
        }
        None
    }

    /// Join the gaps in ring order: the path from the previous gap's end to
    /// the gap's start, then the gap's interior vertices.
    fn stitch(
        &self,
        gaps: &[LineString<f64>],
        guides: &[LineString<f64>],
        au_id: &str,
        shapes: &mut ShapeLogger,
    ) -> Result<LineString<f64>, MatchingError> {
        let Some(mut previous_end) = gaps.last().and_then(|g| g.0.last().copied()) else {
            return Err(MatchingError::RingConstruction("no gaps to stitch".into()));
        };

        let mut coords: Vec<Coord<f64>> = Vec::new();
        for (gap, guide) in gaps.iter().zip(guides) {
            let (Some(&start), Some(&end)) = (gap.0.first(), gap.0.last()) else { continue };
            let path = self
                .path_with_retry(previous_end, start, guide)
                .ok_or(MatchingError::PathNotFound { from: previous_end, to: start })?;
            shapes.line("path", au_id, &path);

            path.0.iter().for_each(|&c| push_distinct(&mut coords, c));
            if gap.0.len() > 2 {
                gap.0[1..gap.0.len() - 1].iter().for_each(|&c| push_distinct(&mut coords, c));
            }
            previous_end = end;
        }

        if let Some(&first) = coords.first() { push_distinct(&mut coords, first) }
        if coords.len() < 4 {
            return Err(MatchingError::RingConstruction(format!("ring of {} points", coords.len())));
        }
        Ok(LineString(coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LineNetwork;
    use approx::assert_relative_eq;
    use geo::line_string;
    use segindex::SegmentIndex;

    #[test]
    fn trim_drops_a_short_segment_left_by_a_moved_start() {
        let cutter = line_string![(x: 0.0, y: -5.0), (x: 0.0, y: 5.0)];
        let network = LineNetwork::new([&cutter]);
        let no_coast = SegmentIndex::from_line_string(&cutter);
        let closed = ClosedBoundaries::new(Vec::new());
        let tolerances = Tolerances::default();
        let refs = References { no_coast: &no_coast, network: &network, closed_boundaries: &closed };
        let matcher = RingMatcher::new(refs, &tolerances);
        let mut shapes = ShapeLogger::new("shapes");

        let overshooting = line_string![(x: -1.0, y: 0.0), (x: 0.5, y: 0.0), (x: 10.0, y: 0.0)];
        let trimmed = matcher.trim(&overshooting, "a", &mut shapes);
        assert_eq!(trimmed.0.len(), 2);
        assert_relative_eq!(trimmed.0[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(trimmed.0[0].y, 0.0, epsilon = 1e-9);
        assert_eq!(trimmed.0[1], Coord { x: 10.0, y: 0.0 });
        assert_eq!(shapes.count("deleted_segments"), 1);

        // The start does not move, so the short segment stays.
        let flush = line_string![(x: 0.0, y: 0.0), (x: 0.5, y: 0.0), (x: 10.0, y: 0.0)];
        assert_eq!(matcher.trim(&flush, "b", &mut shapes), flush);
        assert_eq!(shapes.count("deleted_segments"), 1);
    }
}
