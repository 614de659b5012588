use anyhow::Result;
use tracing::info;

use crate::cli::{Cli, NoCoastArgs};
use crate::commands::{close_shapes, init_logging, load_config, read_lines, shape_logger, write_lines};
use crate::reference::{landmask_polygons, no_coast_lines};
use crate::store::GeoJsonStore;

pub fn run(cli: &Cli, args: &NoCoastArgs) -> Result<()> {
    init_logging(cli.verbose, args.run.log_dir.as_deref())?;
    let config = load_config(&args.run)?;
    let country = &args.run.country;
    info!("[START] landmask no-coast lines for {country}");

    let landmask = GeoJsonStore::load(&args.landmask, &config.attributes.id)?;
    let coast = read_lines(&GeoJsonStore::load(&args.coast, &config.attributes.id)?)?;
    let mut shapes = shape_logger(&args.run);

    let land = landmask_polygons(&landmask, &config, country)?;
    let lines = no_coast_lines(&land, &coast, config.tolerances.group_rule, &mut shapes)?;

    write_lines(&args.output, &lines, &config, country, args.run.force)?;
    close_shapes(shapes)?;
    info!("[END] landmask no-coast lines for {country}");
    Ok(())
}
