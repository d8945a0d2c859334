//! Relay: background driver of the counting engine.
//!
//! The relay owns exactly one engine for exactly one session. It runs on a
//! dedicated thread, drives a fixed-cadence poll loop, and surfaces engine
//! state as a sequence of `UpdateEvent`s. It never touches UI state and it
//! never blocks the interactive thread.
//!
//! The session controller enters `Initializing` when it hands the engine
//! over; from there the relay reports every transition:
//!
//! ```text
//! Running -> Stopping -> Stopped
//!    \-> Failed (open failure skips Running entirely)
//! ```
//!
//! `Stopped` and `Failed` are terminal; a relay is never reused. Every
//! spawned relay emits exactly one `Finished` event, last, on every exit
//! path.
//!
//! The relay MUST NOT:
//! - Call the engine from any thread but its own
//! - Leave the engine running after a poll error
//! - Busy-poll between ticks

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{anyhow, Result};

use crate::dispatch::{UpdateEvent, UpdateSender};
use crate::engine::{CountingEngine, FramePoll};
use crate::session::{SessionError, SessionState};
use crate::snapshot::Snapshot;

/// Granularity of the cooperative cadence sleep. A stop request is noticed
/// within this bound while the relay is sleeping between ticks.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

pub struct Relay;

impl Relay {
    /// Spawn the relay thread for one session.
    ///
    /// Engine construction state is whatever the caller handed over;
    /// `open` (which may block on model loading) runs on the relay thread,
    /// so the caller returns immediately.
    pub fn spawn(
        engine: Box<dyn CountingEngine>,
        video_path: PathBuf,
        model_path: PathBuf,
        cadence: Duration,
        updates: UpdateSender,
    ) -> Result<RelayHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let running_thread = running.clone();
        let join = std::thread::Builder::new()
            .name("relay".to_string())
            .spawn(move || {
                run_relay(
                    engine,
                    &video_path,
                    &model_path,
                    cadence,
                    &updates,
                    &running_thread,
                );
            })
            .map_err(|e| anyhow!("failed to spawn relay thread: {}", e))?;
        Ok(RelayHandle {
            running,
            join: Some(join),
        })
    }
}

/// Owner-side handle to a running relay.
#[derive(Debug)]
pub struct RelayHandle {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl RelayHandle {
    /// Request a cooperative stop. Idempotent. No new tick begins after
    /// this returns; a tick already in flight is allowed to complete.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// True once the relay thread has exited (or was never spawned).
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |join| join.is_finished())
    }

    /// Wait up to `timeout` for the relay thread to exit, then reap it.
    ///
    /// The engine may not support forced interruption, so there is no
    /// preemptive path: on timeout the thread is left running and the
    /// caller decides whether that leak is acceptable.
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_finished() {
                if let Some(join) = self.join.take() {
                    if join.join().is_err() {
                        log::error!("relay thread panicked");
                    }
                }
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::ShutdownTimeout { timeout });
            }
            std::thread::sleep(SLEEP_SLICE);
        }
    }
}

enum LoopExit {
    EndOfStream,
    StopRequested,
    PollFailed(String),
}

fn run_relay(
    mut engine: Box<dyn CountingEngine>,
    video_path: &Path,
    model_path: &Path,
    cadence: Duration,
    updates: &UpdateSender,
    running: &AtomicBool,
) {
    log::info!(
        "relay: opening {} with engine '{}'",
        video_path.display(),
        engine.name()
    );
    if let Err(e) = engine.open(video_path, model_path) {
        let err = SessionError::EngineInit {
            reason: e.to_string(),
        };
        log::error!("relay: {}", err);
        updates.send(UpdateEvent::Status(err.to_string()));
        updates.send(UpdateEvent::Lifecycle(SessionState::Failed(
            err.to_string(),
        )));
        updates.send(UpdateEvent::Finished);
        // Engine is dropped here without ever being polled.
        return;
    }

    updates.send(UpdateEvent::Status(format!(
        "Processing {}",
        video_path.display()
    )));
    updates.send(UpdateEvent::Lifecycle(SessionState::Running));

    let exit = poll_loop(engine.as_mut(), cadence, updates, running);

    let failure = match exit {
        LoopExit::EndOfStream => {
            log::info!("relay: end of stream");
            updates.send(UpdateEvent::Status("Video finished.".to_string()));
            None
        }
        LoopExit::StopRequested => {
            log::info!("relay: stop requested");
            None
        }
        LoopExit::PollFailed(reason) => {
            let err = SessionError::Poll { reason };
            log::error!("relay: {}", err);
            updates.send(UpdateEvent::Status(err.to_string()));
            Some(err.to_string())
        }
    };

    if failure.is_none() {
        updates.send(UpdateEvent::Lifecycle(SessionState::Stopping));
    }
    engine.stop();
    running.store(false, Ordering::SeqCst);

    let terminal = match failure {
        Some(reason) => SessionState::Failed(reason),
        None => SessionState::Stopped,
    };
    updates.send(UpdateEvent::Lifecycle(terminal));
    updates.send(UpdateEvent::Finished);
    log::info!("relay: finished");
}

fn poll_loop(
    engine: &mut dyn CountingEngine,
    cadence: Duration,
    updates: &UpdateSender,
    running: &AtomicBool,
) -> LoopExit {
    let mut tick = 0u64;
    while running.load(Ordering::SeqCst) {
        let tick_started = Instant::now();
        tick += 1;

        let frame = match engine.poll_frame() {
            Ok(FramePoll::Frame(frame)) => Some(frame),
            Ok(FramePoll::Pending) => None,
            Ok(FramePoll::EndOfStream) => return LoopExit::EndOfStream,
            Err(e) => return LoopExit::PollFailed(format!("poll_frame: {e}")),
        };
        let counts = match engine.poll_counts() {
            Ok(counts) => counts,
            Err(e) => return LoopExit::PollFailed(format!("poll_counts: {e}")),
        };

        updates.send(UpdateEvent::Snapshot(Snapshot {
            frame,
            counts,
            tick,
            captured_at: SystemTime::now(),
        }));

        sleep_remainder(cadence, tick_started, running);
    }
    LoopExit::StopRequested
}

/// Sleep out the rest of the cadence interval in short slices so a stop
/// request does not have to wait for a full interval.
fn sleep_remainder(cadence: Duration, tick_started: Instant, running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        let elapsed = tick_started.elapsed();
        if elapsed >= cadence {
            break;
        }
        std::thread::sleep((cadence - elapsed).min(SLEEP_SLICE));
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
