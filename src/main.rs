use anyhow::Result;
use clap::Parser;

use au_matching::cli::{Cli, Commands};
use au_matching::commands::{au_match, coast, no_coast};

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Coast(args) => coast::run(&cli, args),
        Commands::NoCoast(args) => no_coast::run(&cli, args),
        Commands::Match(args) => au_match::run(&cli, args),
    }
}
