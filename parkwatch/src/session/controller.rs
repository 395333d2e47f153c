//! Session lifecycle and the worker loop.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant as TokioInstant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::detection::{DetectionConfig, ParkingEvent, ParkingStateMachine};
use crate::source::{LocationSource, SampleItem, SampleStream};
use crate::telemetry::{SessionMetrics, SessionSnapshot};

use super::error::SessionError;
use super::handler::SessionHandler;

/// Owns one live tracking run.
///
/// A session is started against a [`LocationSource`] and runs a single
/// worker task until [`stop`](Self::stop) is called, the source's stream
/// ends, or the confirm timer cannot be scheduled. Dropping a running
/// session cancels its worker.
pub struct TrackingSession {
    config: DetectionConfig,
    metrics: Arc<SessionMetrics>,
    cancellation: CancellationToken,
    worker: Option<JoinHandle<Result<(), SessionError>>>,
}

impl TrackingSession {
    /// Create a session with validated thresholds.
    pub fn new(config: DetectionConfig) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::InvalidConfig)?;
        Ok(Self {
            config,
            metrics: Arc::new(SessionMetrics::new()),
            cancellation: CancellationToken::new(),
            worker: None,
        })
    }

    /// Create a session with default thresholds.
    pub fn with_defaults() -> Self {
        Self {
            config: DetectionConfig::default(),
            metrics: Arc::new(SessionMetrics::new()),
            cancellation: CancellationToken::new(),
            worker: None,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Counters for the current (or last) run.
    pub fn metrics(&self) -> Arc<SessionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Whether a worker is still processing samples.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Subscribe to `source` and start processing samples.
    ///
    /// Every run starts from a fresh state machine and fresh metrics.
    /// Must be called from within a Tokio runtime.
    pub fn start<H: SessionHandler>(
        &mut self,
        source: &dyn LocationSource,
        handler: H,
    ) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        let runtime = Handle::try_current().map_err(|e| SessionError::NoRuntime(e.to_string()))?;
        let stream = source.subscribe().map_err(SessionError::Subscribe)?;

        self.metrics = Arc::new(SessionMetrics::new());
        self.cancellation = CancellationToken::new();

        let worker = Worker {
            machine: ParkingStateMachine::new(self.config.clone()),
            handler,
            stream,
            metrics: Arc::clone(&self.metrics),
            cancellation: self.cancellation.clone(),
        };
        self.worker = Some(runtime.spawn(worker.run()));

        info!(
            stationary_radius_m = self.config.stationary_radius_m,
            leaving_radius_m = self.config.leaving_radius_m,
            confirm_delay_secs = self.config.confirm_delay.as_secs_f64(),
            anchor = %self.config.stationary_anchor,
            "Tracking session started"
        );
        Ok(())
    }

    /// Stop the worker and discard any pending confirm timer.
    ///
    /// Returns `Ok(None)` if the session was never started or was already
    /// stopped, otherwise the final counters. An error that ended the
    /// worker on its own is returned here.
    pub async fn stop(&mut self) -> Result<Option<SessionSnapshot>, SessionError> {
        let Some(worker) = self.worker.take() else {
            return Ok(None);
        };
        self.cancellation.cancel();

        let outcome = match worker.await {
            Ok(result) => result,
            Err(e) => Err(SessionError::WorkerFailed(e.to_string())),
        };
        let snapshot = self.metrics.snapshot();
        info!(%snapshot, "Tracking session stopped");
        outcome.map(|_| Some(snapshot))
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

struct Worker<H> {
    machine: ParkingStateMachine,
    handler: H,
    stream: SampleStream,
    metrics: Arc<SessionMetrics>,
    cancellation: CancellationToken,
}

impl<H: SessionHandler> Worker<H> {
    async fn run(mut self) -> Result<(), SessionError> {
        loop {
            let deadline = match self.machine.confirm_deadline() {
                Ok(deadline) => deadline.map(TokioInstant::from_std),
                Err(e) => {
                    let error = SessionError::TimerSchedule(e);
                    warn!(error = %error, "Ending tracking session");
                    self.handler.on_warning(&error);
                    self.discard_timer();
                    return Err(error);
                }
            };
            let wake = deadline.unwrap_or_else(TokioInstant::now);

            // Cancellation wins over samples, and a sample arriving at the
            // same instant as the deadline is seen before the timer.
            tokio::select! {
                biased;

                _ = self.cancellation.cancelled() => {
                    self.discard_timer();
                    debug!("Tracking worker cancelled");
                    return Ok(());
                }

                item = self.stream.recv() => match item {
                    Some(item) => self.handle_item(item),
                    None => {
                        self.discard_timer();
                        info!("Location stream ended");
                        return Ok(());
                    }
                },

                _ = sleep_until(wake), if deadline.is_some() => {
                    let now = TokioInstant::now().into_std();
                    if let Some(event) = self.machine.poll_timer(now) {
                        self.dispatch(event);
                    }
                }
            }
        }
    }

    fn handle_item(&mut self, item: SampleItem) {
        let fix = match item {
            Ok(fix) => fix,
            Err(e) => {
                self.metrics.source_error();
                warn!(error = %e, "Location source reported an error");
                self.handler.on_warning(&SessionError::Source(e));
                return;
            }
        };

        let checked = fix.coordinate().map_err(SessionError::from).and_then(|c| {
            if self.machine.config().strict_coordinates {
                c.validate().map_err(SessionError::from)
            } else {
                Ok(c)
            }
        });
        let coordinate = match checked {
            Ok(c) => c,
            Err(e) => {
                self.metrics.sample_skipped();
                warn!(error = %e, "Skipping sample");
                self.handler.on_warning(&e);
                return;
            }
        };

        self.metrics.sample_received();
        debug!(
            lat = coordinate.latitude,
            lon = coordinate.longitude,
            state = %self.machine.state(),
            "Sample"
        );
        self.handler.on_update(coordinate);

        let had_timer = self.machine.has_pending_timer();
        let event = self.machine.feed(coordinate, TokioInstant::now().into_std());
        match (had_timer, self.machine.has_pending_timer(), event) {
            (false, true, _) => self.metrics.timer_started(),
            (true, false, None) => self.metrics.timer_cancelled(),
            _ => {}
        }

        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: ParkingEvent) {
        match event {
            ParkingEvent::ParkDetected(at) => {
                self.metrics.park_detected();
                self.handler.on_park(at);
            }
            ParkingEvent::LeavingDetected(at) => {
                self.metrics.leave_detected();
                self.handler.on_leave(at);
            }
        }
    }

    fn discard_timer(&mut self) {
        if self.machine.cancel_timer() {
            self.metrics.timer_cancelled();
            debug!("Pending park discarded");
        }
    }
}
