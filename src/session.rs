//! Session lifecycle: authoritative state, error taxonomy, controller.
//!
//! Exactly one `SessionController` owns the authoritative `SessionState`.
//! The relay reports transitions through lifecycle events; the controller
//! folds them in via `observe`. Nothing else writes the state.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::{UpdateEvent, UpdateSender};
use crate::engine::CountingEngine;
use crate::relay::{Relay, RelayHandle};

/// Bound on reaping a relay thread that has already emitted `Finished`.
const REAP_TIMEOUT: Duration = Duration::from_secs(1);

/// Lifecycle state of one analysis session.
///
/// `Stopped` and `Failed` are terminal; a new session requires a fresh
/// relay and engine. State is never reused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Failed(String),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Failed(_))
    }

    /// Active sessions reject a second `start`.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Initializing | SessionState::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopping => write!(f, "stopping"),
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Session-level failures.
///
/// Engine-originated errors are converted to these at the relay boundary
/// and surfaced as status text; they never cross into the interactive
/// thread as panics.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Engine construction or open failed. The session ends in `Failed`;
    /// the engine is never polled.
    #[error("engine initialization failed: {reason}")]
    EngineInit { reason: String },

    /// A tick's poll call failed. Triggers an orderly stop.
    #[error("poll failed: {reason}")]
    Poll { reason: String },

    /// Start requested while a session is initializing or running.
    /// Rejected synchronously, no state change.
    #[error("a session is already running")]
    AlreadyRunning,

    /// The relay thread did not exit within the close bound. Logged;
    /// application shutdown proceeds regardless.
    #[error("relay did not stop within {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    /// Map recenter requested for a site that is not configured.
    #[error("unknown camera site '{name}'")]
    UnknownSite { name: String },
}

/// Single entry/exit point for starting and stopping sessions.
///
/// Enforces one active session at a time and owns the relay handle for the
/// session's duration.
pub struct SessionController {
    state: SessionState,
    relay: Option<RelayHandle>,
    cadence: Duration,
    updates: UpdateSender,
}

impl SessionController {
    pub fn new(cadence: Duration, updates: UpdateSender) -> Self {
        Self {
            state: SessionState::Idle,
            relay: None,
            cadence,
            updates,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Start a session: hand the engine to a fresh relay.
    ///
    /// Rejected with `AlreadyRunning` while a session is initializing or
    /// running; a rejected call spawns nothing, changes no state, and drops
    /// the handed-in engine unopened. Blocking engine initialization
    /// happens on the relay thread, never here.
    pub fn start(
        &mut self,
        engine: Box<dyn CountingEngine>,
        video_path: &Path,
        model_path: &Path,
    ) -> Result<(), SessionError> {
        if self.state.is_active() {
            log::warn!("session: start rejected, already running");
            return Err(SessionError::AlreadyRunning);
        }
        self.reap_relay();

        self.state = SessionState::Initializing;
        match Relay::spawn(
            engine,
            video_path.to_path_buf(),
            model_path.to_path_buf(),
            self.cadence,
            self.updates.clone(),
        ) {
            Ok(handle) => {
                self.relay = Some(handle);
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.state = SessionState::Failed(reason.clone());
                Err(SessionError::EngineInit { reason })
            }
        }
    }

    /// Request a cooperative stop. Idempotent; a no-op when no session is
    /// live.
    pub fn stop(&self) {
        if let Some(relay) = &self.relay {
            relay.request_stop();
        }
    }

    /// Fold a relay-reported event into the authoritative state.
    pub fn observe(&mut self, event: &UpdateEvent) {
        match event {
            UpdateEvent::Lifecycle(state) => {
                log::debug!("session: {} -> {}", self.state, state);
                self.state = state.clone();
            }
            UpdateEvent::Finished => self.reap_relay(),
            UpdateEvent::Snapshot(_) | UpdateEvent::Status(_) => {}
        }
    }

    /// User-facing status text for the current state.
    pub fn status_text(&self) -> String {
        match &self.state {
            SessionState::Idle => "Ready.".to_string(),
            SessionState::Initializing => "Opening video...".to_string(),
            SessionState::Running => "Processing...".to_string(),
            SessionState::Stopping => "Stopping...".to_string(),
            SessionState::Stopped => "Processing finished.".to_string(),
            SessionState::Failed(reason) => format!("Error: {reason}"),
        }
    }

    /// Close path: request a stop and wait up to `timeout` for the relay
    /// thread to exit.
    ///
    /// On timeout the handle is dropped and the thread leaked; the caller
    /// logs the returned error and proceeds with shutdown. Never fatal.
    pub fn shutdown(&mut self, timeout: Duration) -> Result<(), SessionError> {
        let Some(mut relay) = self.relay.take() else {
            return Ok(());
        };
        relay.request_stop();
        match relay.join_timeout(timeout) {
            Ok(()) => {
                if !self.state.is_terminal() {
                    self.state = SessionState::Stopped;
                }
                Ok(())
            }
            Err(err) => {
                log::error!("session: {}", err);
                Err(err)
            }
        }
    }

    /// Reap a relay whose session has ended. The thread exits right after
    /// emitting `Finished`, so the bounded join is a formality; if it does
    /// not make the bound the thread is detached and logged.
    fn reap_relay(&mut self) {
        if let Some(mut relay) = self.relay.take() {
            relay.request_stop();
            if relay.join_timeout(REAP_TIMEOUT).is_err() {
                log::warn!("session: relay thread still exiting, detached");
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::dispatch_channel;
    use crate::engine::{StubEngine, StubStep};
    use std::path::PathBuf;

    fn paths() -> (PathBuf, PathBuf) {
        (
            PathBuf::from("stub://video"),
            PathBuf::from("models/yolov8n.onnx"),
        )
    }

    #[test]
    fn second_start_is_rejected_without_touching_engine() {
        let (tx, _rx) = dispatch_channel();
        let mut controller = SessionController::new(Duration::from_millis(10), tx);
        let (video, model) = paths();

        let first = StubEngine::synthetic(1000);
        controller.start(Box::new(first), &video, &model).unwrap();

        let second = StubEngine::synthetic(1000);
        let stats = second.stats_handle();
        let err = controller
            .start(Box::new(second), &video, &model)
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRunning));
        assert!(!stats.opened());

        controller.stop();
        controller.shutdown(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn stop_without_session_is_a_noop() {
        let (tx, _rx) = dispatch_channel();
        let controller = SessionController::new(Duration::from_millis(10), tx);
        controller.stop();
        controller.stop();
        assert_eq!(*controller.state(), SessionState::Idle);
    }

    #[test]
    fn observe_folds_lifecycle_events() {
        let (tx, _rx) = dispatch_channel();
        let mut controller = SessionController::new(Duration::from_millis(10), tx);
        controller.observe(&UpdateEvent::Lifecycle(SessionState::Running));
        assert_eq!(*controller.state(), SessionState::Running);
        controller.observe(&UpdateEvent::Lifecycle(SessionState::Failed(
            "bad model".to_string(),
        )));
        assert!(controller.state().is_terminal());
        assert_eq!(controller.status_text(), "Error: bad model");
    }

    #[test]
    fn shutdown_without_session_is_ok() {
        let (tx, _rx) = dispatch_channel();
        let mut controller = SessionController::new(Duration::from_millis(10), tx);
        assert!(controller.shutdown(Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn scripted_session_reaches_stopped_after_shutdown() {
        let (tx, rx) = dispatch_channel();
        let mut controller = SessionController::new(Duration::from_millis(1), tx);
        let (video, model) = paths();
        let engine = StubEngine::scripted(vec![StubStep::counts(&[("car", 1)])]);
        controller.start(Box::new(engine), &video, &model).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !controller.state().is_terminal() {
            assert!(std::time::Instant::now() < deadline, "session stuck");
            for event in rx.drain_timeout(Duration::from_millis(20)) {
                controller.observe(&event);
            }
        }
        assert_eq!(*controller.state(), SessionState::Stopped);
        controller.shutdown(Duration::from_secs(1)).unwrap();
    }
}
