use crate::snapshot::{FrameImage, Snapshot};

/// Latest-frame projection.
///
/// Holds the most recent non-empty frame, converted to RGB for display.
/// A snapshot without a frame (or with an empty one) leaves the previous
/// rendering untouched, so the view is monotonic with respect to the last
/// real frame.
#[derive(Default)]
pub struct FrameView {
    current: Option<FrameImage>,
}

impl FrameView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, snapshot: &Snapshot) {
        if let Some(frame) = &snapshot.frame {
            if !frame.is_empty() {
                self.current = Some(frame.clone().into_rgb());
            }
        }
    }

    pub fn current(&self) -> Option<&FrameImage> {
        self.current.as_ref()
    }

    pub fn has_frame(&self) -> bool {
        self.current.is_some()
    }

    /// (width, height) of the displayed frame, if any.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.current.as_ref().map(|f| (f.width, f.height))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
