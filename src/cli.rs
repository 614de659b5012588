use clap::{ArgGroup, Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// AU boundary matching against the reference boundaries and the landmask
#[derive(Parser, Debug)]
#[command(name = "au_matching", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the coastlines of a country on its landmask
    Coast(CoastArgs),

    /// Extract the landmask boundary parts not running along the coast
    NoCoast(NoCoastArgs),

    /// Reconcile AU boundaries against the reference boundaries
    Match(MatchArgs),
}

/// Options shared by every step.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Country code selecting the features to process
    #[arg(short, long)]
    pub country: String,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory for the log file and the diagnostic shapefiles
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CoastArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Boundary lines (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Landmask polygons (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub landmask: PathBuf,

    /// Output coast paths (GeoJSON)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct NoCoastArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Landmask polygons (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub landmask: PathBuf,

    /// Coast paths computed by `coast` (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub coast: PathBuf,

    /// Output no-coast lines (GeoJSON)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("landmask_source").required(true).args(["landmask", "no_coast"])))]
pub struct MatchArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// AU polygons (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub au: PathBuf,

    /// Boundary lines (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub boundaries: PathBuf,

    /// Landmask polygons, to derive the no-coast lines on the fly
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub landmask: Option<PathBuf>,

    /// Precomputed no-coast lines (GeoJSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub no_coast: Option<PathBuf>,

    /// Output AU polygons (GeoJSON)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn schema_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn match_needs_a_landmask_source() {
        let parsed = Cli::try_parse_from(["au_matching", "match", "-c", "fr", "au.json", "b.json", "-o", "out.json"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "au_matching", "-v", "match", "-c", "fr", "au.json", "b.json", "--no-coast", "nc.json", "-o", "out.json",
        ]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Match(args) = cli.command else { panic!("expected match") };
        assert_eq!(args.run.country, "fr");
        assert_eq!(args.no_coast, Some(PathBuf::from("nc.json")));
    }
}
