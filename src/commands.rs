//! Command implementations and the setup they share.

pub mod au_match;
pub mod coast;
pub mod no_coast;

use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use geo::{Geometry, LineString};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::RunArgs;
use crate::params::Config;
use crate::reference::feature_lines;
use crate::shapelog::ShapeLogger;
use crate::store::{Feature, FeatureFilter, FeatureStore, GeoJsonStore};

/// Name of the plain-text log written in the log directory.
pub const LOG_FILE: &str = "au_matching.log";

/// Log to stderr, and to `<log_dir>/au_matching.log` when a directory is
/// given. `RUST_LOG` overrides the level derived from `verbose`.
pub fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
            let path = dir.join(LOG_FILE);
            let file = File::create(&path).with_context(|| format!("create log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("install log subscriber")?;
    Ok(())
}

pub fn load_config(run: &RunArgs) -> Result<Config> {
    match &run.config {
        Some(path) => {
            info!("[config] {}", path.display());
            Config::load(path)
        }
        None => Ok(Config::default()),
    }
}

pub fn shape_logger(run: &RunArgs) -> ShapeLogger {
    match &run.log_dir {
        Some(dir) => ShapeLogger::new(dir.join("shapes")),
        None => ShapeLogger::disabled(),
    }
}

/// Every line of the features of `store`.
pub fn read_lines(store: &GeoJsonStore) -> Result<Vec<LineString<f64>>> {
    Ok(store.features(&FeatureFilter::all())?.iter().flat_map(|f| feature_lines(&f.geometry)).collect())
}

/// One feature per line, tagged with the country.
pub fn write_lines(path: &Path, lines: &[LineString<f64>], config: &Config, country: &str, force: bool) -> Result<()> {
    let features = lines.iter()
        .enumerate()
        .map(|(i, ls)| {
            Feature::new(format!("{country}-{i}"), Geometry::LineString(ls.clone()))
                .with_property(&config.attributes.country, country)
        })
        .collect();
    GeoJsonStore::from_features(features, &config.attributes.id).save(path, force)?;
    info!("[output] {} lines -> {}", lines.len(), path.display());
    Ok(())
}

pub(crate) fn close_shapes(shapes: ShapeLogger) -> Result<()> {
    let written = shapes.close()?;
    if !written.is_empty() { info!("[shapelog] {} layers written", written.len()) }
    Ok(())
}
