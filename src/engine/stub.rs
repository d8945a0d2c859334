//! Stub counting engine.
//!
//! Stands in for the real inference engine in tests and demo runs. Two
//! modes:
//!
//! - **Scripted**: plays back a fixed list of `StubStep`s, then signals
//!   end-of-stream. Tests use this to drive exact snapshot sequences and
//!   failure injection.
//! - **Synthetic**: generates deterministic frames and slowly growing
//!   counts for a bounded number of ticks. The `consoled` binary selects
//!   this for `stub://` video paths.
//!
//! The stub accepts only model paths ending in `.onnx`, mirroring the real
//! engine's loader, so open-failure paths can be exercised without a model
//! file on disk.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::config::default_categories;
use crate::engine::{CountingEngine, FramePoll};
use crate::snapshot::{ChannelOrder, FrameImage};

const SYNTHETIC_WIDTH: u32 = 640;
const SYNTHETIC_HEIGHT: u32 = 480;

/// Observable counters for assertions on engine usage.
#[derive(Debug, Default)]
pub struct StubEngineStats {
    opened: AtomicBool,
    frame_polls: AtomicU64,
    count_polls: AtomicU64,
    stops: AtomicU64,
}

impl StubEngineStats {
    pub fn opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn frame_polls(&self) -> u64 {
        self.frame_polls.load(Ordering::SeqCst)
    }

    pub fn count_polls(&self) -> u64 {
        self.count_polls.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::SeqCst)
    }
}

/// One scripted tick.
#[derive(Clone, Debug)]
pub struct StubStep {
    frame: Option<FrameImage>,
    counts: Vec<(String, u64)>,
    fail: Option<String>,
}

impl StubStep {
    /// A tick that updates cumulative counts without a new frame.
    pub fn counts(pairs: &[(&str, u64)]) -> Self {
        Self {
            frame: None,
            counts: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            fail: None,
        }
    }

    /// Attach a new frame to this tick.
    pub fn with_frame(mut self, frame: FrameImage) -> Self {
        self.frame = Some(frame);
        self
    }

    /// A tick whose poll fails with the given reason.
    pub fn failure(reason: &str) -> Self {
        Self {
            frame: None,
            counts: Vec::new(),
            fail: Some(reason.to_string()),
        }
    }
}

enum Mode {
    Scripted(VecDeque<StubStep>),
    Synthetic {
        remaining: u64,
        frame_counter: u64,
    },
}

/// Deterministic stand-in engine.
pub struct StubEngine {
    mode: Mode,
    categories: Vec<String>,
    current_counts: HashMap<String, u64>,
    opened: bool,
    stats: Arc<StubEngineStats>,
}

impl StubEngine {
    /// Engine that plays back `steps` in order, then ends the stream.
    ///
    /// The category set is the union of keys appearing in the script, in
    /// first-appearance order.
    pub fn scripted(steps: Vec<StubStep>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for step in &steps {
            for (key, _) in &step.counts {
                if !categories.iter().any(|c| c == key) {
                    categories.push(key.clone());
                }
            }
        }
        Self {
            mode: Mode::Scripted(steps.into()),
            categories,
            current_counts: HashMap::new(),
            opened: false,
            stats: Arc::new(StubEngineStats::default()),
        }
    }

    /// Engine that generates `ticks` synthetic frames with growing counts.
    pub fn synthetic(ticks: u64) -> Self {
        Self {
            mode: Mode::Synthetic {
                remaining: ticks,
                frame_counter: 0,
            },
            categories: default_categories(),
            current_counts: HashMap::new(),
            opened: false,
            stats: Arc::new(StubEngineStats::default()),
        }
    }

    /// Handle for asserting on engine usage after the engine has been
    /// moved onto the relay thread.
    pub fn stats_handle(&self) -> Arc<StubEngineStats> {
        self.stats.clone()
    }

    fn apply_counts(&mut self, pairs: &[(String, u64)]) {
        for (key, value) in pairs {
            self.current_counts.insert(key.clone(), *value);
        }
    }
}

impl CountingEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn open(&mut self, video_path: &Path, model_path: &Path) -> Result<()> {
        let video = video_path.to_string_lossy();
        if video.trim().is_empty() {
            return Err(anyhow!("no video selected"));
        }
        if model_path.extension().and_then(|e| e.to_str()) != Some("onnx") {
            return Err(anyhow!(
                "unsupported model format: {}",
                model_path.display()
            ));
        }
        self.opened = true;
        self.stats.opened.store(true, Ordering::SeqCst);
        log::info!("StubEngine: opened {}", video);
        Ok(())
    }

    fn poll_frame(&mut self) -> Result<FramePoll> {
        if !self.opened {
            return Err(anyhow!("engine polled before open"));
        }
        self.stats.frame_polls.fetch_add(1, Ordering::SeqCst);
        match &mut self.mode {
            Mode::Scripted(steps) => {
                let Some(step) = steps.pop_front() else {
                    return Ok(FramePoll::EndOfStream);
                };
                if let Some(reason) = step.fail {
                    return Err(anyhow!(reason));
                }
                self.apply_counts(&step.counts);
                match step.frame {
                    Some(frame) => Ok(FramePoll::Frame(frame)),
                    None => Ok(FramePoll::Pending),
                }
            }
            Mode::Synthetic {
                remaining,
                frame_counter,
            } => {
                if *remaining == 0 {
                    return Ok(FramePoll::EndOfStream);
                }
                *remaining -= 1;
                *frame_counter += 1;
                let counter = *frame_counter;
                let frame = synthetic_frame(counter);
                // One vehicle of a rotating category crosses the line
                // every 10 frames.
                if counter % 10 == 0 {
                    let categories = self.categories.clone();
                    let index = ((counter / 10) as usize) % categories.len();
                    let key = &categories[index];
                    *self.current_counts.entry(key.clone()).or_insert(0) += 1;
                }
                Ok(FramePoll::Frame(frame))
            }
        }
    }

    fn poll_counts(&mut self) -> Result<HashMap<String, u64>> {
        if !self.opened {
            return Err(anyhow!("engine polled before open"));
        }
        self.stats.count_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.current_counts.clone())
    }

    fn categories(&self) -> Vec<String> {
        self.categories.clone()
    }

    fn stop(&mut self) {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        log::info!("StubEngine: stopped");
    }
}

fn synthetic_frame(counter: u64) -> FrameImage {
    let pixel_count = (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize;
    let mut data = vec![0u8; pixel_count];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = ((i as u64 + counter) % 256) as u8;
    }
    FrameImage::new(data, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, ChannelOrder::Bgr)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
