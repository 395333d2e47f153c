//! Distance command.

use parkwatch::geo::{distance, Coordinate};

use crate::error::CliError;

/// Print the great-circle distance between two points.
pub fn run(from: Coordinate, to: Coordinate) -> Result<(), CliError> {
    println!("{:.1} m", distance(from, to));
    Ok(())
}
