use clap::{Parser, Subcommand};
use log::LevelFilter;
use panelprep::{filter_population, make_map, FilterPaths, GenMapError, MapFiles, PopFilterError};
use thiserror::Error;

const INFO: &str = "\
panelprep: prepare reference panel inputs
usage: panelprep [--help] <subcommand>

Subcommands:

  make-map: build a map file from a legend and a genetic map.
  filter-pop: keep the haplotypes of one population or group.

";

#[derive(Parser)]
#[clap(name = "panelprep")]
#[clap(about = INFO)]
struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the map file for one chromosome.
    ///
    /// Reads 1000GP_Phase3_chr<label>.legend and
    /// genetic_map_chr<label>_combined_b37.txt from the current directory and
    /// writes chr<label>.map, with columns:
    ///
    ///  - chromosome label
    ///  - 1-based variant ordinal
    ///  - genetic position (in centiMorgans, copied from the genetic map)
    ///  - physical position
    ///
    /// Each variant gets the genetic position of the marker the genetic map
    /// cursor rests on after at most one step forward, so the output should
    /// be checked if the genetic map is much denser than the legend.
    MakeMap {
        /// Create map for CHROMOSOME
        #[arg(long, required = true)]
        chromosome: String,
    },
    /// Subset a haplotype file and its map file to one population or group.
    ///
    /// Sites that are monomorphic within the selected haplotypes are dropped
    /// from both outputs. The selected column indices are printed first.
    FilterPop {
        /// File detailing population and group of individuals
        #[arg(long, required = true)]
        sample: String,
        /// Select population or group
        #[arg(long, required = true)]
        select: String,
        /// Input haplotype file
        #[arg(long, required = true)]
        hap: String,
        /// Output haplotype file
        #[arg(long, required = true)]
        hapout: String,
        /// Input map file
        #[arg(long, required = true)]
        map: String,
        /// Output map file
        #[arg(long, required = true)]
        mapout: String,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    GenMap(#[from] GenMapError),
    #[error("{0}")]
    PopFilter(#[from] PopFilterError),
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match cli.command {
        Some(Commands::MakeMap { chromosome }) => {
            let files = MapFiles::for_chromosome(&chromosome);
            make_map(&chromosome, &files)?;
        }
        Some(Commands::FilterPop {
            sample,
            select,
            hap,
            hapout,
            map,
            mapout,
        }) => {
            let paths = FilterPaths {
                sample,
                select,
                hap,
                hapout,
                map,
                mapout,
            };
            filter_population(&paths)?;
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
