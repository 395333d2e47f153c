//! Replay command - run detection over a recorded track.

use std::path::{Path, PathBuf};

use console::style;
use parkwatch::detection::replay::{load_track, replay, ReplayReport};
use parkwatch::detection::{DetectionConfig, ParkingEvent};

use super::common::{resolve_detection_config, DetectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the replay command.
pub struct ReplayArgs {
    pub file: PathBuf,
    pub flush: bool,
    pub detection: DetectionArgs,
}

/// Run the replay command.
pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("replay");
    let detection = resolve_detection_config(&args.detection, runner.config())?;

    let report = replay_file(&args.file, &detection, args.flush)?;

    println!("Replay of {}", args.file.display());
    println!();
    for timed in &report.events {
        let label = match timed.event {
            ParkingEvent::ParkDetected(_) => style("PARKED").green().bold(),
            ParkingEvent::LeavingDetected(_) => style("LEFT").yellow().bold(),
        };
        println!(
            "  {:>9.1}s  {:<6}  {}",
            timed.at_secs,
            label,
            timed.event.coordinate()
        );
    }
    if report.events.is_empty() {
        println!("  (no events)");
    }
    println!();
    println!(
        "Samples: {} fed, {} skipped | Parks: {} | Leaves: {}",
        report.samples_fed,
        report.samples_skipped,
        report.parks(),
        report.leaves()
    );

    Ok(())
}

fn replay_file(
    path: &Path,
    detection: &DetectionConfig,
    flush: bool,
) -> Result<ReplayReport, CliError> {
    let points = load_track(path)?;
    tracing::info!(points = points.len(), path = %path.display(), "Loaded track");
    Ok(replay(detection, &points, flush)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_replay_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"t": 0, "lat": 53.5511, "lon": 9.9937}}"#).unwrap();
        writeln!(file, r#"{{"t": 5, "lat": 53.5511, "lon": 9.9937}}"#).unwrap();
        writeln!(file, r#"{{"t": 35, "lat": 53.5511, "lon": 9.9937}}"#).unwrap();
        writeln!(file, r#"{{"t": 40, "lat": 53.5520, "lon": 9.9937}}"#).unwrap();

        let report = replay_file(file.path(), &DetectionConfig::default(), false).unwrap();
        assert_eq!(report.parks(), 1);
        assert_eq!(report.leaves(), 1);
    }

    #[test]
    fn test_replay_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = replay_file(
            &dir.path().join("missing.jsonl"),
            &DetectionConfig::default(),
            false,
        );
        assert!(matches!(result, Err(CliError::Replay(_))));
    }
}
