//! ParkWatch CLI - Command-line interface
//!
//! Runs live parking detection over a stream of GPS fixes, replays recorded
//! tracks and manages configuration.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use parkwatch::geo::Coordinate;

use commands::common::{parse_coordinate, DetectionArgs};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "parkwatch")]
#[command(version = parkwatch::VERSION)]
#[command(about = "Detect parking and leaving from a stream of GPS fixes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Track live fixes read from stdin as JSON lines ({"lat": .., "lon": ..})
    Track {
        /// Report detected spots under this user id (overrides config)
        #[arg(long)]
        user: Option<String>,

        /// Report spots as paid parking
        #[arg(long)]
        paid: bool,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Replay a recorded track ({"t": .., "lat": .., "lon": ..} per line)
    Replay {
        /// Track file
        file: PathBuf,

        /// Fire a confirm timer still pending after the last point
        #[arg(long)]
        flush: bool,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Great-circle distance between two points in meters
    Distance {
        /// First point as LAT,LON
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        from: Coordinate,

        /// Second point as LAT,LON
        #[arg(value_parser = parse_coordinate, allow_hyphen_values = true)]
        to: Coordinate,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Track {
            user,
            paid,
            detection,
        } => commands::track::run(commands::track::TrackArgs {
            user,
            paid,
            detection,
        }),
        Commands::Replay {
            file,
            flush,
            detection,
        } => commands::replay::run(commands::replay::ReplayArgs {
            file,
            flush,
            detection,
        }),
        Commands::Distance { from, to } => commands::distance::run(from, to),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
