//! A single captured frame: a dense row-major grid of BGR samples.

use image::{GrayImage, ImageBuffer, Luma};

use crate::color::Color;
use crate::geometry::{Dims, Point};

/// One captured image from the video source.
///
/// Pixels are stored row-major, three bytes per sample, in the capture
/// backend's (blue, green, red) channel order.
#[derive(Clone, Debug)]
pub struct Frame {
    height: u32,
    width: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps a raw BGR buffer. The buffer length must be `height * width * 3`.
    pub fn from_bgr(height: u32, width: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (height * width * 3) as usize,
            "BGR buffer size does not match {}x{}",
            width,
            height
        );
        Self {
            height,
            width,
            data,
        }
    }

    /// A frame filled with a single color. Useful for replay sources.
    pub fn solid(dims: Dims, color: Color) -> Self {
        let mut data = Vec::with_capacity((dims.height * dims.width * 3) as usize);
        for _ in 0..dims.height * dims.width {
            data.extend_from_slice(&[color.b, color.g, color.r]);
        }
        Self {
            height: dims.height,
            width: dims.width,
            data,
        }
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.height, self.width)
    }

    /// Reads the pixel at an actual-grid point (already normalized), clamped
    /// to the frame edge. The frame must be non-empty; `crop` can produce a
    /// zero-extent frame when both corners clamp to the same edge.
    pub fn pixel(&self, p: Point) -> Color {
        assert!(
            self.height > 0 && self.width > 0,
            "pixel read on an empty frame"
        );
        let y = p.y.min(self.height - 1);
        let x = p.x.min(self.width - 1);
        let i = ((y * self.width + x) * 3) as usize;
        Color::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Overwrites the pixel at an actual-grid point.
    pub fn set_pixel(&mut self, p: Point, color: Color) {
        assert!(
            self.height > 0 && self.width > 0,
            "pixel write on an empty frame"
        );
        let y = p.y.min(self.height - 1);
        let x = p.x.min(self.width - 1);
        let i = ((y * self.width + x) * 3) as usize;
        self.data[i] = color.b;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.r;
    }

    /// Crops the rectangle between two actual-grid corners, clamped to bounds.
    pub fn crop(&self, top_left: Point, bottom_right: Point) -> Frame {
        let y0 = top_left.y.min(self.height);
        let x0 = top_left.x.min(self.width);
        let y1 = bottom_right.y.clamp(y0, self.height);
        let x1 = bottom_right.x.clamp(x0, self.width);

        let mut data = Vec::with_capacity(((y1 - y0) * (x1 - x0) * 3) as usize);
        for y in y0..y1 {
            let row = ((y * self.width + x0) * 3) as usize;
            let end = ((y * self.width + x1) * 3) as usize;
            data.extend_from_slice(&self.data[row..end]);
        }
        Frame {
            height: y1 - y0,
            width: x1 - x0,
            data,
        }
    }

    /// Converts to grayscale for OCR, optionally inverting intensities.
    ///
    /// Inversion is used when text is light-on-dark so tesseract always sees
    /// dark text on a light background. Uses the ITU-R BT.601 luma formula.
    pub fn to_gray(&self, invert: bool) -> GrayImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let c = self.pixel(Point::new(y, x));
            let luma =
                0.299 * c.r as f32 + 0.587 * c.g as f32 + 0.114 * c.b as f32;
            let v = luma.round().clamp(0.0, 255.0) as u8;
            Luma([if invert { 255 - v } else { v }])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_read_back() {
        let mut frame = Frame::solid(Dims::new(4, 4), Color::new(1, 2, 3));
        frame.set_pixel(Point::new(2, 3), Color::new(10, 20, 30));
        assert_eq!(frame.pixel(Point::new(0, 0)), Color::new(1, 2, 3));
        assert_eq!(frame.pixel(Point::new(2, 3)), Color::new(10, 20, 30));
    }

    #[test]
    fn test_crop_extent_and_content() {
        let mut frame = Frame::solid(Dims::new(10, 10), Color::new(0, 0, 0));
        frame.set_pixel(Point::new(3, 4), Color::new(9, 9, 9));
        let crop = frame.crop(Point::new(2, 2), Point::new(6, 8));
        assert_eq!(crop.dims(), Dims::new(4, 6));
        assert_eq!(crop.pixel(Point::new(1, 2)), Color::new(9, 9, 9));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = Frame::solid(Dims::new(10, 10), Color::new(0, 0, 0));
        let crop = frame.crop(Point::new(8, 8), Point::new(20, 20));
        assert_eq!(crop.dims(), Dims::new(2, 2));
    }

    #[test]
    fn test_fully_clamped_crop_is_empty() {
        let frame = Frame::solid(Dims::new(10, 10), Color::new(0, 0, 0));
        let crop = frame.crop(Point::new(10, 0), Point::new(20, 20));
        assert_eq!(crop.dims(), Dims::new(0, 10));
        // A zero-extent frame is a legal value; conversion visits no pixels
        assert_eq!(crop.to_gray(false).dimensions(), (10, 0));
    }

    #[test]
    #[should_panic(expected = "empty frame")]
    fn test_pixel_read_on_empty_frame_panics_with_message() {
        let frame = Frame::solid(Dims::new(10, 10), Color::new(0, 0, 0));
        let crop = frame.crop(Point::new(10, 10), Point::new(20, 20));
        crop.pixel(Point::new(0, 0));
    }

    #[test]
    fn test_to_gray_inverts() {
        let frame = Frame::solid(Dims::new(2, 2), Color::new(255, 255, 255));
        assert_eq!(frame.to_gray(false).get_pixel(0, 0)[0], 255);
        assert_eq!(frame.to_gray(true).get_pixel(0, 0)[0], 0);
    }
}
