//! Frame acquisition from the video source.
//!
//! This module provides:
//! - The `Frame` pixel grid type
//! - The `FrameSource` trait the runner pulls frames through
//! - A live camera backend (`CameraSource`, behind the `camera` feature)
//! - A deterministic `ReplaySource` for tests and dry runs

pub mod frame;

#[cfg(feature = "camera")]
pub mod camera;

pub use frame::Frame;

#[cfg(feature = "camera")]
pub use camera::CameraSource;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Failure to obtain a frame from the capture device.
///
/// Fatal to a run: the automaton cannot proceed without a frame, so callers
/// abort rather than guess state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureError {
    pub reason: String,
}

impl CaptureError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture failed: {}", self.reason)
    }
}

impl std::error::Error for CaptureError {}

/// A source of live frames. Blocks until a frame is available.
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}

/// Replays a fixed sequence of frames, then repeats the last one forever.
///
/// Deterministic stand-in for a capture device. The runner owns its source,
/// so the capture counter is a shared handle observers can keep a clone of.
pub struct ReplaySource {
    frames: Vec<Frame>,
    next: usize,
    captures: Rc<Cell<usize>>,
}

impl ReplaySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        assert!(!frames.is_empty(), "ReplaySource needs at least one frame");
        Self {
            frames,
            next: 0,
            captures: Rc::new(Cell::new(0)),
        }
    }

    /// Handle to the number of `capture` calls made so far.
    pub fn capture_count(&self) -> Rc<Cell<usize>> {
        self.captures.clone()
    }
}

impl FrameSource for ReplaySource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        self.captures.set(self.captures.get() + 1);
        let frame = self.frames[self.next].clone();
        if self.next + 1 < self.frames.len() {
            self.next += 1;
        }
        Ok(frame)
    }
}
