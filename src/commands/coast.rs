use anyhow::Result;
use tracing::info;

use crate::cli::{Cli, CoastArgs};
use crate::commands::{close_shapes, init_logging, load_config, shape_logger, write_lines};
use crate::reference::{boundary_lines, coast_paths, landmask_polygons};
use crate::store::GeoJsonStore;

pub fn run(cli: &Cli, args: &CoastArgs) -> Result<()> {
    init_logging(cli.verbose, args.run.log_dir.as_deref())?;
    let config = load_config(&args.run)?;
    let country = &args.run.country;
    info!("[START] coast paths for {country}");

    let boundaries = GeoJsonStore::load(&args.boundaries, &config.attributes.id)?;
    let landmask = GeoJsonStore::load(&args.landmask, &config.attributes.id)?;
    let mut shapes = shape_logger(&args.run);

    let (coast, _) = boundary_lines(&boundaries, &config, country)?;
    let land = landmask_polygons(&landmask, &config, country)?;
    let paths = coast_paths(&land, &coast, &config.tolerances, &mut shapes);

    write_lines(&args.output, &paths, &config, country, args.run.force)?;
    close_shapes(shapes)?;
    info!("[END] coast paths for {country}");
    Ok(())
}
