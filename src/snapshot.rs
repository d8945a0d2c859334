//! Telemetry payloads exchanged between the relay and the view layer.
//!
//! - `FrameImage`: one decoded, annotated video frame with an explicit channel order.
//! - `Snapshot`: one poll tick's combined frame + counts payload.
//!
//! Snapshots flow in one direction only: relay thread -> dispatcher -> views.
//! Views receive them by value and never hold engine references.

use std::collections::HashMap;
use std::time::SystemTime;

/// Channel order of a frame's pixel data.
///
/// Engines typically produce BGR (the convention of their decode stack);
/// displays consume RGB. Conversion happens in the frame view, once, at
/// render time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

/// One decoded frame. Tightly packed, 3 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channel_order: ChannelOrder,
}

impl FrameImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channel_order: ChannelOrder) -> Self {
        Self {
            data,
            width,
            height,
            channel_order,
        }
    }

    /// An empty frame carries no pixels. Engines may hand one back instead of
    /// blocking when no new frame is ready; consumers must ignore it.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Convert to RGB order, swapping the first and third channel of every
    /// pixel when the source is BGR. Already-RGB frames pass through.
    pub fn into_rgb(mut self) -> Self {
        if self.channel_order == ChannelOrder::Rgb {
            return self;
        }
        for pixel in self.data.chunks_exact_mut(3) {
            pixel.swap(0, 2);
        }
        self.channel_order = ChannelOrder::Rgb;
        self
    }
}

/// One poll tick's payload: the latest annotated frame (if a new one was
/// available) and the cumulative counts per category.
///
/// `frame: None` means "no new frame this tick" and must not clear a
/// previously rendered frame downstream. Counts are cumulative totals owned
/// by the engine; each snapshot replaces the previous one wholesale.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub frame: Option<FrameImage>,
    pub counts: HashMap<String, u64>,
    pub tick: u64,
    pub captured_at: SystemTime,
}

impl Snapshot {
    /// Count for a category. Unknown keys read as zero.
    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
