//! Notifier that writes notices to the log.

use tracing::info;

use super::error::ReportError;
use super::model::SpotNotice;
use super::traits::{BoxFuture, Notifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, notice: &'a SpotNotice) -> BoxFuture<'a, Result<(), ReportError>> {
        Box::pin(async move {
            let spot = notice.spot();
            info!(
                spot = %spot.id,
                lat = spot.coordinate.latitude,
                lon = spot.coordinate.longitude,
                available = spot.available,
                "{}",
                notice
            );
            Ok(())
        })
    }
}
