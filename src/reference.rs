//! Per-country reference preparation.
//!
//! Coastlines from the boundary table are followed on the landmask to get
//! coast paths; the landmask boundary minus those paths gives the no-coast
//! lines the AU rings are classified against. Boundary lines give the path
//! network and the closed boundaries used for loops.

use anyhow::Result;
use geo::{Geometry, LineString, MultiPolygon};
use segindex::{Group, SegmentIndex, SegmentIndexCollection};
use tracing::{debug, info, warn};

use crate::geom::merge_lines;
use crate::matching::au::as_multipolygon;
use crate::matching::{extract_parts, sub_string, ClosedBoundaries, GroupRule, References};
use crate::network::{BoundaryNetwork, LineNetwork};
use crate::params::{Config, Tolerances};
use crate::shapelog::ShapeLogger;
use crate::store::{Feature, FeatureFilter, FeatureStore, Predicate};

/// Separator of the per-country lists of multi-country boundary features.
const LIST_SEPARATOR: char = '#';

/// Features whose country attribute mentions `country`.
pub fn country_filter(config: &Config, country: &str) -> FeatureFilter {
    FeatureFilter::all().and(Predicate::like(&config.attributes.country, &format!("%{country}%")))
}

/// Boundary type of `feature` for `country`. Multi-country features carry
/// parallel `#`-separated lists of countries and types.
pub fn boundary_type_for(feature: &Feature, config: &Config, country: &str) -> Option<String> {
    let types = feature.attribute(&config.attributes.boundary_type)?;
    if !types.contains(LIST_SEPARATOR) { return Some(types) }

    let countries = feature.attribute(&config.attributes.country).unwrap_or_default();
    countries.split(LIST_SEPARATOR)
        .zip(types.split(LIST_SEPARATOR))
        .find(|(c, _)| *c == country)
        .map(|(_, t)| t.to_string())
}

pub fn is_coastline(feature: &Feature, config: &Config, country: &str) -> bool {
    boundary_type_for(feature, config, country).is_some_and(|t| t == config.values.type_coastline)
}

/// Linear parts of a feature geometry.
pub fn feature_lines(geometry: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::LineString(ls) => vec![ls.clone()],
        Geometry::MultiLineString(mls) => mls.0.clone(),
        _ => Vec::new(),
    }
}

/// Boundary lines of `country`, split into coastlines and the others.
pub fn boundary_lines(
    boundaries: &dyn FeatureStore,
    config: &Config,
    country: &str,
) -> Result<(Vec<LineString<f64>>, Vec<LineString<f64>>)> {
    let (mut coast, mut other) = (Vec::new(), Vec::new());
    for feature in boundaries.features(&country_filter(config, country))? {
        let lines = feature_lines(&feature.geometry);
        if lines.is_empty() { warn!("[reference] boundary {} is not linear, skipped", feature.id) }
        if is_coastline(&feature, config, country) { coast.extend(lines) } else { other.extend(lines) }
    }
    Ok((coast, other))
}

/// Land-area polygons of `country`.
pub fn landmask_polygons(landmask: &dyn FeatureStore, config: &Config, country: &str) -> Result<MultiPolygon<f64>> {
    let filter = FeatureFilter::all()
        .and(Predicate::equals(&config.attributes.land_cover_type, &config.values.type_land_area))
        .and(Predicate::equals(&config.attributes.country, country));

    let mut polygons = Vec::new();
    for feature in landmask.features(&filter)? {
        match as_multipolygon(&feature.geometry) {
            Some(mp) => polygons.extend(mp.0),
            None => warn!("[reference] landmask {} is not areal, skipped", feature.id),
        }
    }
    Ok(MultiPolygon::new(polygons))
}

/// Follow each merged coastline on the landmask boundary.
pub fn coast_paths(
    landmask: &MultiPolygon<f64>,
    coastlines: &[LineString<f64>],
    tolerances: &Tolerances,
    shapes: &mut ShapeLogger,
) -> Vec<LineString<f64>> {
    let rings: Vec<&LineString<f64>> = landmask.iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .collect();
    let network = LineNetwork::new(rings).with_search_budget(tolerances.path_search_budget);

    let merged = merge_lines(coastlines);
    if merged.is_empty() { debug!("[reference] no coastline") }

    let mut paths = Vec::new();
    for coast in &merged {
        // A closed coast is followed as two halves.
        let pieces = if coast.is_closed() && coast.0.len() > 3 {
            let mid = coast.0.len() / 2;
            vec![LineString(coast.0[..=mid].to_vec()), LineString(coast.0[mid..].to_vec())]
        } else {
            vec![coast.clone()]
        };

        for piece in &pieces {
            let (Some(&start), Some(&end)) = (piece.0.first(), piece.0.last()) else { continue };
            match network.path_along(
                start,
                end,
                piece,
                tolerances.coast_max_dist,
                tolerances.coast_search_dist,
                tolerances.coast_snap_dist,
            ) {
                Some(path) => {
                    shapes.line("coastline_path", "coast", &path);
                    paths.push(path);
                }
                None => {
                    debug!("[reference] coast path not found from ({}, {})", start.x, start.y);
                    shapes.line("coastline_path_not_found", "coast", piece);
                }
            }
        }
    }
    info!("[reference] {} coast paths from {} coastlines", paths.len(), merged.len());
    paths
}

/// Parts of the landmask boundary not running along a coast path.
pub fn no_coast_lines(
    landmask: &MultiPolygon<f64>,
    coast_paths: &[LineString<f64>],
    rule: GroupRule,
    shapes: &mut ShapeLogger,
) -> Result<Vec<LineString<f64>>> {
    let coast_index = SegmentIndex::from_line_strings(coast_paths);
    let parts = extract_parts(&coast_index, &Geometry::MultiPolygon(landmask.clone()), rule)?;

    let rings = landmask.iter().flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
    let mut lines = Vec::new();
    for (ring, classified) in rings.zip(parts.lines()) {
        for &range in &classified.not_touching {
            let line = sub_string(range, ring);
            shapes.line("boundary_not_touching_coast", "landmask", &line);
            lines.push(line);
        }
    }
    info!("[reference] {} landmask no-coast lines", lines.len());
    Ok(lines)
}

/// Index no-coast lines: closed lines each get their own group, open lines
/// share `Ungrouped`.
pub fn no_coast_collection(lines: &[LineString<f64>]) -> SegmentIndexCollection {
    let mut collection = SegmentIndexCollection::new();
    let mut next_group = 0;
    for line in lines {
        let group = if line.is_closed() {
            next_group += 1;
            Group::Id(next_group - 1)
        } else {
            Group::Ungrouped
        };
        collection.add(SegmentIndex::from_line_string(line), group);
    }
    collection
}

/// Everything an AU matching run reads.
pub struct ReferenceData {
    pub no_coast_lines: Vec<LineString<f64>>,
    no_coast_index: SegmentIndexCollection,
    boundary_network: LineNetwork,
    closed_boundaries: ClosedBoundaries,
}

impl ReferenceData {
    /// `network_lines` feed the path network; closed boundaries come from
    /// the merge of `network_lines` and `coast_lines`.
    pub fn from_parts(
        no_coast_lines: Vec<LineString<f64>>,
        network_lines: &[LineString<f64>],
        coast_lines: &[LineString<f64>],
        tolerances: &Tolerances,
    ) -> Self {
        let no_coast_index = no_coast_collection(&no_coast_lines);
        let boundary_network = LineNetwork::new(network_lines).with_search_budget(tolerances.path_search_budget);
        let closed_boundaries = ClosedBoundaries::new(
            merge_lines(network_lines.iter().chain(coast_lines)).into_iter().filter(LineString::is_closed),
        );
        info!(
            "[reference] {} no-coast lines, {} network edges, {} closed boundaries",
            no_coast_lines.len(),
            boundary_network.num_edges(),
            closed_boundaries.len(),
        );
        Self { no_coast_lines, no_coast_index, boundary_network, closed_boundaries }
    }

    /// Read the boundaries of `country` and pair them with precomputed
    /// no-coast lines.
    pub fn load(
        boundaries: &dyn FeatureStore,
        no_coast_lines: Vec<LineString<f64>>,
        config: &Config,
        country: &str,
    ) -> Result<Self> {
        let (coast, other) = boundary_lines(boundaries, config, country)?;
        Ok(Self::from_parts(no_coast_lines, &other, &coast, &config.tolerances))
    }

    /// Derive the no-coast lines from the landmask, then load.
    pub fn build(
        boundaries: &dyn FeatureStore,
        landmask: &dyn FeatureStore,
        config: &Config,
        country: &str,
        shapes: &mut ShapeLogger,
    ) -> Result<Self> {
        let (coast, other) = boundary_lines(boundaries, config, country)?;
        let land = landmask_polygons(landmask, config, country)?;
        let paths = coast_paths(&land, &coast, &config.tolerances, shapes);
        let no_coast = no_coast_lines(&land, &paths, config.tolerances.group_rule, shapes)?;
        Ok(Self::from_parts(no_coast, &other, &coast, &config.tolerances))
    }

    pub fn references(&self) -> References<'_> {
        References {
            no_coast: &self.no_coast_index,
            network: &self.boundary_network as &dyn BoundaryNetwork,
            closed_boundaries: &self.closed_boundaries,
        }
    }
}
