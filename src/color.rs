//! Color values in the capture backend's native channel order.
//!
//! Frames arrive as (blue, green, red) samples, so reference colors are
//! authored in that order too. Comparison is per-channel with a tolerance
//! band, since capture cards and video compression shift values slightly.

/// Per-channel tolerance used when a matcher is built without an explicit one.
pub const DEFAULT_TOLERANCE: u8 = 8;

/// A (blue, green, red) color sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// True iff every channel of `self` lies within `tol` of `reference`.
    pub fn within_tolerance(&self, reference: Color, tol: u8) -> bool {
        self.b.abs_diff(reference.b) <= tol
            && self.g.abs_diff(reference.g) <= tol
            && self.r.abs_diff(reference.r) <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always_matches_itself() {
        let c = Color::new(17, 203, 244);
        for tol in [0, 1, 8, 255] {
            assert!(c.within_tolerance(c, tol), "tolerance {} failed", tol);
        }
    }

    #[test]
    fn test_within_tolerance_per_channel() {
        let reference = Color::new(100, 100, 100);
        assert!(Color::new(108, 92, 100).within_tolerance(reference, 8));
        // One channel out of band fails the whole comparison
        assert!(!Color::new(109, 100, 100).within_tolerance(reference, 8));
        assert!(!Color::new(100, 100, 91).within_tolerance(reference, 8));
    }

    #[test]
    fn test_within_tolerance_no_overflow_at_extremes() {
        assert!(Color::new(0, 0, 0).within_tolerance(Color::new(255, 255, 255), 255));
        assert!(!Color::new(0, 0, 0).within_tolerance(Color::new(255, 0, 0), 200));
    }
}
