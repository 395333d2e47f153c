//! Track command - live detection over fixes read from stdin.

use std::sync::Arc;

use console::style;
use parkwatch::detection::DetectionConfig;
use parkwatch::report::{
    AuthSession, CoordinateGeocoder, LogNotifier, MemorySpotStore, ReporterStats, SpotReporter,
};
use parkwatch::session::{ChannelHandler, SessionEvent, TrackingSession};
use parkwatch::source::JsonLinesSource;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::common::{resolve_detection_config, DetectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the track command.
pub struct TrackArgs {
    pub user: Option<String>,
    pub paid: bool,
    pub detection: DetectionArgs,
}

/// Run the track command.
pub fn run(args: TrackArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("track");
    let config = runner.config();

    let detection = resolve_detection_config(&args.detection, config)?;
    let user_id = args.user.or_else(|| config.reporter.user_id.clone());
    let paid = args.paid || config.reporter.paid;

    println!("ParkWatch v{}", parkwatch::VERSION);
    println!("==============");
    println!();
    println!("Stationary radius: {} m", detection.stationary_radius_m);
    println!("Leaving radius:    {} m", detection.leaving_radius_m);
    println!(
        "Confirm delay:     {} s",
        detection.confirm_delay.as_secs_f64()
    );
    println!("Anchor:            {}", detection.stationary_anchor);
    match &user_id {
        Some(id) => println!("Reporting as:      {}{}", id, if paid { " (paid)" } else { "" }),
        None => println!("Reporting:         disabled (set --user or reporter.user_id)"),
    }
    println!();
    println!("Reading fixes from stdin. Press Ctrl+C to stop.");
    println!();

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let result = runtime.block_on(track(detection, user_id, paid));
    // The stdin reader blocks until the next line arrives.
    runtime.shutdown_background();
    result
}

async fn track(
    detection: DetectionConfig,
    user_id: Option<String>,
    paid: bool,
) -> Result<(), CliError> {
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received shutdown signal, stopping session...");
        signal.cancel();
    })?;

    let source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));
    let (handler, mut events) = ChannelHandler::new();
    let mut session = TrackingSession::new(detection)?;
    session.start(&source, handler)?;

    let store = Arc::new(MemorySpotStore::new());
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let reporter_task = user_id.map(|id| {
        let reporter = SpotReporter::new(
            AuthSession::new(id),
            store.clone(),
            Arc::new(CoordinateGeocoder),
            Arc::new(LogNotifier),
        )
        .with_paid(paid);
        // Runs until the event channel closes so queued events are not lost.
        tokio::spawn(async move { reporter.run(report_rx, CancellationToken::new()).await })
    });

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => {
                    print_event(&event);
                    if reporter_task.is_some() {
                        let _ = report_tx.send(event);
                    }
                }
                None => break,
            },
        }
    }

    let outcome = session.stop().await;
    drop(report_tx);

    let stats = match reporter_task {
        Some(task) => task.await.ok(),
        None => None,
    };

    let snapshot = outcome?;
    println!();
    if let Some(snapshot) = snapshot {
        println!("Session: {}", snapshot);
    }
    if let Some(stats) = stats {
        print_reporter_stats(&stats, &store);
    }

    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Update(at) => tracing::debug!(%at, "Fix"),
        SessionEvent::Park(at) => println!("{}  {}", style("PARKED").green().bold(), at),
        SessionEvent::Leave(at) => println!("{}    {}", style("LEFT").yellow().bold(), at),
        SessionEvent::Warning(e) => eprintln!("{} {}", style("warning:").yellow(), e),
    }
}

fn print_reporter_stats(stats: &ReporterStats, store: &MemorySpotStore) {
    println!(
        "Spots: {} reported, {} released, {} failed",
        stats.spots_created, stats.spots_released, stats.failures
    );
    for spot in store.all() {
        println!(
            "  {} {} [{}] {}",
            spot.id,
            spot.address,
            if spot.available { "free" } else { "taken" },
            spot.reported_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
