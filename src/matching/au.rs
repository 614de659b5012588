//! AU matching over a whole feature table.

use ahash::AHashSet;
use anyhow::{Context, Result};
use geo::{Geometry, LineString, MultiPolygon, Polygon};
use tracing::{debug, error, info, warn};

use crate::error::{MatchingError, ResultDefect};
use crate::geom::{is_valid, multipolygons_equivalent, PolygonBuilder};
use crate::matching::refine::refine_area_with_ls_endings;
use crate::matching::ring::{References, RingMatcher, RingOutcome};
use crate::params::Tolerances;
use crate::shapelog::ShapeLogger;
use crate::store::{Feature, FeatureFilter, FeatureStore};

#[derive(Clone, Debug, PartialEq)]
pub enum AuOutcome {
    /// Nothing to change, or the rebuilt geometry equals the input.
    Unmodified,
    /// A new geometry to write back. Invalid geometries are still written.
    Modified { geometry: MultiPolygon<f64>, valid: bool },
    /// Reconstruction produced no polygon; nothing is written.
    Empty,
}

/// Counters of one matching run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub modified: usize,
    pub unmodified: usize,
    pub invalid: usize,
    pub empty: usize,
    pub ring_failures: usize,
    pub written: usize,
}

pub struct AuMatcher<'a> {
    rings: RingMatcher<'a>,
    no_coast_lines: &'a [LineString<f64>],
    tolerances: &'a Tolerances,
}

impl<'a> AuMatcher<'a> {
    pub fn new(refs: References<'a>, no_coast_lines: &'a [LineString<f64>], tolerances: &'a Tolerances) -> Self {
        Self { rings: RingMatcher::new(refs, tolerances), no_coast_lines, tolerances }
    }

    /// Reconcile one AU geometry. Returns the outcome and the number of
    /// rings that could not be rebuilt and were kept unchanged.
    pub fn match_au(&self, id: &str, geometry: &MultiPolygon<f64>, shapes: &mut ShapeLogger) -> (AuOutcome, usize) {
        let mut refined = geometry.clone();
        let inserted = refine_area_with_ls_endings(self.no_coast_lines, &mut refined, self.tolerances.refine_precision);
        if inserted > 0 { debug!("[au] {id}: {inserted} landmask endpoints inserted") }

        let mut builder = PolygonBuilder::new();
        let mut used_loops = AHashSet::new();
        let mut modified = false;
        let mut failures = 0;

        for ring in refined.iter().flat_map(polygon_rings) {
            match self.rings.reconstruct(ring, id, &mut used_loops, shapes) {
                RingOutcome::Reconstructed { rings, modified: m } => {
                    modified |= m;
                    rings.into_iter().for_each(|r| builder.add_ring(r));
                }
                RingOutcome::Failed(e) => {
                    error!("[au] {id}: {e}");
                    failures += 1;
                    builder.add_ring(ring.clone());
                }
            }
        }

        let rebuilt = builder.build();
        if !modified || multipolygons_equivalent(&rebuilt, &refined) {
            shapes.polygon("resulting_polygons_not_modified", id, geometry);
            return (AuOutcome::Unmodified, failures);
        }

        if rebuilt.0.is_empty() {
            error!("[au] {id}: {}", MatchingError::ResultInvalidOrEmpty(ResultDefect::Empty));
            return (AuOutcome::Empty, failures);
        }

        let valid = is_valid(&rebuilt);
        if !valid {
            error!("[au] {id}: {}", MatchingError::ResultInvalidOrEmpty(ResultDefect::Invalid));
            shapes.polygon("resulting_polygons_not_valid", id, &rebuilt);
        }
        shapes.polygon("resulting_polygons", id, &rebuilt);
        (AuOutcome::Modified { geometry: rebuilt, valid }, failures)
    }

    /// Match every AU of `store` selected by `filter` and write the modified
    /// geometries back.
    pub fn run(&self, store: &mut dyn FeatureStore, filter: &FeatureFilter, shapes: &mut ShapeLogger) -> Result<Summary> {
        let total = store.count(filter)?;
        info!("[au] matching {total} AUs");

        let features = store.features(filter)?;
        let step = (total / 10).max(1);
        let mut summary = Summary::default();

        for feature in features {
            summary.processed += 1;
            if summary.processed % step == 0 {
                info!("[au] {}% complete ({}/{total})", summary.processed * 100 / total.max(1), summary.processed);
            }

            let Some(mp) = as_multipolygon(&feature.geometry) else {
                warn!("[au] {}: not an areal geometry, skipped", feature.id);
                continue;
            };

            let (outcome, failures) = self.match_au(&feature.id, &mp, shapes);
            summary.ring_failures += failures;
            match outcome {
                AuOutcome::Unmodified => summary.unmodified += 1,
                AuOutcome::Empty => {
                    summary.modified += 1;
                    summary.empty += 1;
                }
                AuOutcome::Modified { geometry, valid } => {
                    summary.modified += 1;
                    if !valid { summary.invalid += 1 }
                    let updated = Feature { geometry: Geometry::MultiPolygon(geometry), ..feature };
                    store.modify_feature(&updated).with_context(|| format!("write back AU {}", updated.id))?;
                    summary.written += 1;
                }
            }
        }

        info!(
            "[au] done: {} processed, {} modified, {} unmodified, {} invalid, {} empty, {} ring failures",
            summary.processed, summary.modified, summary.unmodified, summary.invalid, summary.empty, summary.ring_failures,
        );
        Ok(summary)
    }
}

fn polygon_rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

pub fn as_multipolygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}
