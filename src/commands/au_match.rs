use anyhow::{bail, Result};
use tracing::info;

use crate::cli::{Cli, MatchArgs};
use crate::commands::{close_shapes, init_logging, load_config, read_lines, shape_logger};
use crate::matching::AuMatcher;
use crate::reference::ReferenceData;
use crate::store::{FeatureFilter, GeoJsonStore, Predicate};

pub fn run(cli: &Cli, args: &MatchArgs) -> Result<()> {
    init_logging(cli.verbose, args.run.log_dir.as_deref())?;
    let config = load_config(&args.run)?;
    let country = &args.run.country;
    info!("[START] AU matching for {country}");

    if !args.run.force && args.output.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", args.output.display());
    }

    let boundaries = GeoJsonStore::load(&args.boundaries, &config.attributes.id)?;
    let mut shapes = shape_logger(&args.run);

    let reference = match (&args.no_coast, &args.landmask) {
        (Some(path), _) => {
            let no_coast = read_lines(&GeoJsonStore::load(path, &config.attributes.id)?)?;
            ReferenceData::load(&boundaries, no_coast, &config, country)?
        }
        (None, Some(path)) => {
            let landmask = GeoJsonStore::load(path, &config.attributes.id)?;
            ReferenceData::build(&boundaries, &landmask, &config, country, &mut shapes)?
        }
        (None, None) => bail!("either --landmask or --no-coast is required"),
    };

    let mut aus = GeoJsonStore::load(&args.au, &config.attributes.id)?;
    let filter = FeatureFilter::all().and(Predicate::equals(&config.attributes.country, country));
    let matcher = AuMatcher::new(reference.references(), &reference.no_coast_lines, &config.tolerances);
    let summary = matcher.run(&mut aus, &filter, &mut shapes)?;

    aus.save(&args.output, args.run.force)?;
    close_shapes(shapes)?;
    info!("[END] AU matching for {country}: {} AUs written", summary.written);
    Ok(())
}
