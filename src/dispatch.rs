//! Cross-thread update delivery.
//!
//! The relay thread produces `UpdateEvent`s; the interactive thread consumes
//! them. Delivery rides on a `std::sync::mpsc` channel used strictly
//! single-producer/single-consumer, so emission order is delivery order.
//!
//! Contract:
//! - Lifecycle and status events are delivered at least once, in order.
//! - Snapshot frame data is best-effort-latest: when the consumer drains a
//!   backlog, snapshots coalesce to the newest one, carrying the newest
//!   non-empty frame. Counts always come from the newest snapshot.
//! - `Finished` is emitted last by the relay, so it is the last event any
//!   consumer observes for a session.

use std::sync::mpsc;
use std::time::Duration;

use crate::session::SessionState;
use crate::snapshot::{FrameImage, Snapshot};

/// One update from the relay to the interactive thread.
#[derive(Clone, Debug)]
pub enum UpdateEvent {
    /// A poll tick's frame + counts payload.
    Snapshot(Snapshot),
    /// A lifecycle transition reported by the relay. The session controller
    /// folds these into the authoritative state; the relay never sets UI
    /// state directly.
    Lifecycle(SessionState),
    /// Human-readable status text for the status bar.
    Status(String),
    /// Terminal marker, exactly one per started session, always last.
    Finished,
}

/// Create the relay-to-UI channel pair.
pub fn dispatch_channel() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::channel();
    (UpdateSender { tx }, UpdateReceiver { rx })
}

/// Producer half, owned by the relay thread.
#[derive(Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<UpdateEvent>,
}

impl UpdateSender {
    /// Send an update. A disconnected receiver means the interactive side
    /// is tearing down; the update is dropped, not an error.
    pub fn send(&self, event: UpdateEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("update dropped: receiver disconnected");
        }
    }
}

/// Consumer half, owned by the interactive thread.
pub struct UpdateReceiver {
    rx: mpsc::Receiver<UpdateEvent>,
}

impl UpdateReceiver {
    /// Blocking receive with a bound. `None` on timeout or disconnect.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<UpdateEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Wait up to `timeout` for the first queued event, then drain
    /// everything else that is already queued, coalescing snapshots.
    ///
    /// Returns events in emission order. At most one `Snapshot` survives:
    /// the newest, with its frame replaced by the newest non-empty frame
    /// seen across the drained backlog (a newer frame is never discarded in
    /// favor of an older one, and frame absence never erases one).
    pub fn drain_timeout(&self, timeout: Duration) -> Vec<UpdateEvent> {
        let mut events = Vec::new();
        match self.rx.recv_timeout(timeout) {
            Ok(event) => events.push(event),
            Err(_) => return events,
        }
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        coalesce_snapshots(events)
    }
}

fn coalesce_snapshots(events: Vec<UpdateEvent>) -> Vec<UpdateEvent> {
    let snapshot_total = events
        .iter()
        .filter(|e| matches!(e, UpdateEvent::Snapshot(_)))
        .count();
    if snapshot_total <= 1 {
        return events;
    }

    let mut out = Vec::with_capacity(events.len() - snapshot_total + 1);
    let mut newest_frame: Option<FrameImage> = None;
    let mut seen = 0usize;
    for event in events {
        match event {
            UpdateEvent::Snapshot(mut snapshot) => {
                seen += 1;
                match snapshot.frame.take() {
                    Some(frame) if !frame.is_empty() => newest_frame = Some(frame),
                    _ => {}
                }
                if seen == snapshot_total {
                    snapshot.frame = newest_frame.take();
                    out.push(UpdateEvent::Snapshot(snapshot));
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
