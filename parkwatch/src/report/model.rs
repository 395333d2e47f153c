//! Records exchanged with the reporting collaborators.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::geo::Coordinate;

/// The signed-in user every reporting operation acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
}

impl AuthSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Store-assigned spot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotId(pub u64);

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reported parking spot.
///
/// A spot is created occupied when its reporter parks there and becomes
/// available once they leave.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSpot {
    pub id: SpotId,
    pub coordinate: Coordinate,
    pub address: String,
    pub paid: bool,
    pub reporter_id: String,
    pub reported_at: DateTime<Utc>,
    pub available: bool,
}

/// Draft of a spot before the store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSpot {
    pub coordinate: Coordinate,
    pub address: String,
    pub paid: bool,
    pub reporter_id: String,
}

/// What gets pushed to other users.
#[derive(Debug, Clone, PartialEq)]
pub enum SpotNotice {
    /// The reporter parked; the spot is taken.
    Taken(ParkingSpot),
    /// The reporter left; the spot is free.
    Freed(ParkingSpot),
}

impl SpotNotice {
    pub fn spot(&self) -> &ParkingSpot {
        match self {
            SpotNotice::Taken(spot) | SpotNotice::Freed(spot) => spot,
        }
    }
}

impl fmt::Display for SpotNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, spot) = match self {
            SpotNotice::Taken(spot) => ("taken", spot),
            SpotNotice::Freed(spot) => ("free", spot),
        };
        write!(
            f,
            "Spot {} at {} is {}{}",
            spot.id,
            spot.address,
            verb,
            if spot.paid { " (paid)" } else { "" }
        )
    }
}
