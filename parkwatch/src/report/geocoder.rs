//! Offline geocoder.

use crate::geo::Coordinate;

use super::error::ReportError;
use super::traits::{BoxFuture, Geocoder};

/// Geocoder that "resolves" a coordinate to its formatted degrees.
///
/// Used when no address service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateGeocoder;

impl Geocoder for CoordinateGeocoder {
    fn reverse(&self, coordinate: Coordinate) -> BoxFuture<'_, Result<String, ReportError>> {
        Box::pin(async move { Ok(coordinate.to_string()) })
    }
}
