use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::snapshot::FrameImage;

/// Result of polling the engine for a frame.
#[derive(Clone, Debug)]
pub enum FramePoll {
    /// A new annotated frame since the last poll. Polling consumes it; the
    /// next poll returns `Pending` until the engine produces another.
    Frame(FrameImage),
    /// No new frame yet. Not an error, and not end-of-stream.
    Pending,
    /// The video is exhausted. No further frames will ever be produced.
    EndOfStream,
}

/// Counting engine trait.
///
/// This is the entire contract the console requires from the external
/// inference collaborator; any engine implementing it is substitutable.
///
/// # Threading
///
/// All methods are invoked from the relay thread, one call at a time.
/// Implementations may spawn their own internal workers but must tolerate
/// `stop` being the last call they ever receive.
pub trait CountingEngine: Send {
    /// Engine identifier, for logs.
    fn name(&self) -> &'static str;

    /// Open a video and load the model. Called exactly once, before any
    /// poll. On error the engine is dropped without further calls.
    fn open(&mut self, video_path: &Path, model_path: &Path) -> Result<()>;

    /// Poll for the latest annotated frame.
    fn poll_frame(&mut self) -> Result<FramePoll>;

    /// Poll cumulative counts per category. Values only ever grow.
    fn poll_counts(&mut self) -> Result<HashMap<String, u64>>;

    /// The fixed category set this engine counts. Stable after `open`.
    fn categories(&self) -> Vec<String>;

    /// Signal the engine to halt. Idempotent.
    fn stop(&mut self);
}
