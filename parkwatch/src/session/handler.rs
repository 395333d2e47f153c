//! Receivers for session output.

use tokio::sync::mpsc;

use crate::geo::Coordinate;

use super::error::SessionError;

/// Receives everything a tracking session reports.
///
/// All methods run on the session worker, one call at a time, in sample
/// order. Implementations should return quickly.
pub trait SessionHandler: Send + 'static {
    /// Every accepted sample, before it reaches the state machine.
    fn on_update(&mut self, coordinate: Coordinate);

    /// A park was confirmed at `coordinate`.
    fn on_park(&mut self, coordinate: Coordinate);

    /// The user left the spot previously parked at `coordinate`.
    fn on_leave(&mut self, coordinate: Coordinate);

    /// A non-fatal problem, or the fatal error that is ending the session.
    fn on_warning(&mut self, _error: &SessionError) {}
}

/// Handler built from three closures.
pub struct Callbacks<U, P, L> {
    on_update: U,
    on_park: P,
    on_leave: L,
}

impl<U, P, L> Callbacks<U, P, L>
where
    U: FnMut(Coordinate) + Send + 'static,
    P: FnMut(Coordinate) + Send + 'static,
    L: FnMut(Coordinate) + Send + 'static,
{
    pub fn new(on_update: U, on_park: P, on_leave: L) -> Self {
        Self {
            on_update,
            on_park,
            on_leave,
        }
    }
}

impl<U, P, L> SessionHandler for Callbacks<U, P, L>
where
    U: FnMut(Coordinate) + Send + 'static,
    P: FnMut(Coordinate) + Send + 'static,
    L: FnMut(Coordinate) + Send + 'static,
{
    fn on_update(&mut self, coordinate: Coordinate) {
        (self.on_update)(coordinate)
    }

    fn on_park(&mut self, coordinate: Coordinate) {
        (self.on_park)(coordinate)
    }

    fn on_leave(&mut self, coordinate: Coordinate) {
        (self.on_leave)(coordinate)
    }

    fn on_warning(&mut self, error: &SessionError) {
        tracing::warn!(error = %error, "Tracking session warning");
    }
}

/// Session output as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Update(Coordinate),
    Park(Coordinate),
    Leave(Coordinate),
    Warning(SessionError),
}

/// Handler forwarding [`SessionEvent`]s into an unbounded channel.
///
/// The channel closes when the session worker ends.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelHandler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SessionEvent) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl SessionHandler for ChannelHandler {
    fn on_update(&mut self, coordinate: Coordinate) {
        self.forward(SessionEvent::Update(coordinate));
    }

    fn on_park(&mut self, coordinate: Coordinate) {
        self.forward(SessionEvent::Park(coordinate));
    }

    fn on_leave(&mut self, coordinate: Coordinate) {
        self.forward(SessionEvent::Leave(coordinate));
    }

    fn on_warning(&mut self, error: &SessionError) {
        self.forward(SessionEvent::Warning(error.clone()));
    }
}
