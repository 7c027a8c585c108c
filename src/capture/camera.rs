//! Live capture device backend (OpenCV videoio).
//!
//! The device is opened once at startup and configured to a fixed width and
//! height; everything downstream assumes only that the aspect ratio holds,
//! normalization handles the absolute resolution.

use std::time::{Duration, Instant};

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::{CaptureError, Frame, FrameSource};

pub struct CameraSource {
    device: VideoCapture,
    timeout: Duration,
}

impl CameraSource {
    /// Opens capture device `index` configured to `width` x `height`.
    pub fn open(
        index: i32,
        width: u32,
        height: u32,
        timeout: Duration,
    ) -> Result<Self, CaptureError> {
        let mut device = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| CaptureError::new(format!("opening device {}: {}", index, e)))?;

        let opened = device
            .is_opened()
            .map_err(|e| CaptureError::new(e.to_string()))?;
        if !opened {
            return Err(CaptureError::new(format!(
                "capture device {} could not be opened",
                index
            )));
        }

        device
            .set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)
            .map_err(|e| CaptureError::new(e.to_string()))?;
        device
            .set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)
            .map_err(|e| CaptureError::new(e.to_string()))?;

        Ok(Self { device, timeout })
    }

    fn read_once(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut mat = Mat::default();
        let got = self
            .device
            .read(&mut mat)
            .map_err(|e| CaptureError::new(format!("reading frame: {}", e)))?;
        if !got || mat.empty() {
            return Ok(None);
        }

        let height = mat.rows() as u32;
        let width = mat.cols() as u32;
        let data = mat
            .data_bytes()
            .map_err(|e| CaptureError::new(format!("accessing frame data: {}", e)))?
            .to_vec();
        Ok(Some(Frame::from_bgr(height, width, data)))
    }
}

impl FrameSource for CameraSource {
    /// Blocks until the device delivers a frame, up to the configured timeout.
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let start = Instant::now();
        loop {
            if let Some(frame) = self.read_once()? {
                return Ok(frame);
            }
            if start.elapsed() > self.timeout {
                return Err(CaptureError::new(format!(
                    "no frame within {}ms",
                    self.timeout.as_millis()
                )));
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}
