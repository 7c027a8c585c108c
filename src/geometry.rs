//! Screen coordinates against a fixed reference resolution.
//!
//! All points in automation tables are authored against the 720x1280
//! reference grid and rescaled to whatever the capture device actually
//! delivers. As long as the aspect ratio matches, the same point lands on
//! the same on-screen feature at any resolution.

/// Height of the reference grid points are authored against.
pub const REFERENCE_HEIGHT: u32 = 720;
/// Width of the reference grid points are authored against.
pub const REFERENCE_WIDTH: u32 = 1280;

/// Pixel dimensions of an actual captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dims {
    pub height: u32,
    pub width: u32,
}

impl Dims {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

/// A (row, column) coordinate on the reference grid.
///
/// `y` is the row (top edge = 0), `x` the column (left edge = 0), matching
/// the frame's `[row][column]` indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub y: u32,
    pub x: u32,
}

impl Point {
    pub const fn new(y: u32, x: u32) -> Self {
        Self { y, x }
    }

    /// Rescales this reference-grid point onto an actual frame's pixel grid.
    pub fn norm(&self, dims: Dims) -> Point {
        Point {
            y: scale(self.y, dims.height, REFERENCE_HEIGHT),
            x: scale(self.x, dims.width, REFERENCE_WIDTH),
        }
    }
}

fn scale(value: u32, actual: u32, reference: u32) -> u32 {
    (value as f64 * actual as f64 / reference as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_identity_at_reference_resolution() {
        let p = Point::new(98, 664);
        let dims = Dims::new(REFERENCE_HEIGHT, REFERENCE_WIDTH);
        assert_eq!(p.norm(dims), p);
    }

    #[test]
    fn test_norm_scales_proportionally() {
        let p = Point::new(360, 640);
        // Double resolution, same aspect ratio
        let scaled = p.norm(Dims::new(1440, 2560));
        assert_eq!(scaled, Point::new(720, 1280));
    }

    #[test]
    fn test_norm_round_trips_within_rounding_error() {
        // Scaling to an equal-aspect resolution and back reproduces the point
        let dims = Dims::new(1080, 1920);
        for &(y, x) in &[(0, 0), (98, 664), (451, 115), (719, 1279)] {
            let p = Point::new(y, x);
            let there = p.norm(dims);
            let back = Point {
                y: scale(there.y, REFERENCE_HEIGHT, dims.height),
                x: scale(there.x, REFERENCE_WIDTH, dims.width),
            };
            assert!(
                back.y.abs_diff(p.y) <= 1 && back.x.abs_diff(p.x) <= 1,
                "round trip of {:?} gave {:?}",
                p,
                back
            );
        }
    }
}
