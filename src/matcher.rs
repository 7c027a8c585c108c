//! Visual predicates over a frame.
//!
//! Matchers are stateless and side-effect-free; a state's rule list reads as
//! an ordered decision tree, with `always_matches` as the unconditional
//! "else" branch placed last. Combinators short-circuit so cheap pixel
//! checks can gate expensive OCR checks.

use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

use crate::capture::Frame;
use crate::color::{Color, DEFAULT_TOLERANCE};
use crate::engine::Session;
use crate::geometry::Point;
use crate::ocr;

/// A pure boolean test over a frame.
///
/// The session is read-only here; it carries the scratch state an earlier
/// action may have recorded (e.g. a remembered marker color).
pub trait Matcher {
    fn matches(&self, frame: &Frame, session: &Session) -> Result<bool>;
}

pub type BoxedMatcher = Box<dyn Matcher>;

struct PixelMatch {
    point: Point,
    colors: Vec<Color>,
    tolerance: u8,
}

impl Matcher for PixelMatch {
    fn matches(&self, frame: &Frame, _session: &Session) -> Result<bool> {
        let observed = frame.pixel(self.point.norm(frame.dims()));
        Ok(self
            .colors
            .iter()
            .any(|c| observed.within_tolerance(*c, self.tolerance)))
    }
}

/// True iff the pixel at `point` matches any of `colors` within the default
/// tolerance.
pub fn pixel_match(point: Point, colors: Vec<Color>) -> BoxedMatcher {
    pixel_match_tol(point, colors, DEFAULT_TOLERANCE)
}

/// `pixel_match` with a per-call tolerance.
pub fn pixel_match_tol(point: Point, colors: Vec<Color>, tolerance: u8) -> BoxedMatcher {
    assert!(!colors.is_empty(), "pixel_match needs at least one color");
    Box::new(PixelMatch {
        point,
        colors,
        tolerance,
    })
}

struct TextMatch {
    expected: String,
    top_left: Point,
    bottom_right: Point,
    invert: bool,
}

impl Matcher for TextMatch {
    fn matches(&self, frame: &Frame, _session: &Session) -> Result<bool> {
        let dims = frame.dims();
        let crop = frame.crop(self.top_left.norm(dims), self.bottom_right.norm(dims));
        let text = ocr::recognize(&crop.to_gray(self.invert))?;
        Ok(normalize_whitespace(&text).contains(&self.expected))
    }
}

/// True iff OCR over the cropped region finds `expected` as an exact
/// substring. `invert` flips intensities for light-on-dark text.
pub fn text_match(expected: &str, top_left: Point, bottom_right: Point, invert: bool) -> BoxedMatcher {
    Box::new(TextMatch {
        expected: expected.to_string(),
        top_left,
        bottom_right,
        invert,
    })
}

/// Collapses whitespace runs so OCR line breaks don't defeat substring tests.
fn normalize_whitespace(text: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let ws = WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    ws.replace_all(text.trim(), " ").into_owned()
}

struct AllMatch {
    inner: Vec<BoxedMatcher>,
}

impl Matcher for AllMatch {
    fn matches(&self, frame: &Frame, session: &Session) -> Result<bool> {
        for m in &self.inner {
            if !m.matches(frame, session)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Conjunction; stops at the first false sub-matcher.
pub fn all_match(inner: Vec<BoxedMatcher>) -> BoxedMatcher {
    Box::new(AllMatch { inner })
}

struct AnyMatch {
    inner: Vec<BoxedMatcher>,
}

impl Matcher for AnyMatch {
    fn matches(&self, frame: &Frame, session: &Session) -> Result<bool> {
        for m in &self.inner {
            if m.matches(frame, session)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Disjunction; stops at the first true sub-matcher.
pub fn any_match(inner: Vec<BoxedMatcher>) -> BoxedMatcher {
    Box::new(AnyMatch { inner })
}

struct AlwaysMatches;

impl Matcher for AlwaysMatches {
    fn matches(&self, _frame: &Frame, _session: &Session) -> Result<bool> {
        Ok(true)
    }
}

/// Constant true - the unconditional fallback transition.
pub fn always_matches() -> BoxedMatcher {
    Box::new(AlwaysMatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ReplaySource;
    use crate::geometry::Dims;
    use crate::link::RecordingLink;

    const DIMS: Dims = Dims {
        height: 720,
        width: 1280,
    };

    fn test_session() -> Session {
        let frame = Frame::solid(DIMS, Color::new(0, 0, 0));
        Session::new(
            Box::new(ReplaySource::new(vec![frame])),
            Box::new(RecordingLink::new()),
        )
    }

    /// Fails the test if it is ever evaluated.
    struct MustNotEvaluate;

    impl Matcher for MustNotEvaluate {
        fn matches(&self, _frame: &Frame, _session: &Session) -> Result<bool> {
            panic!("short-circuit violated: sub-matcher was evaluated");
        }
    }

    fn constant(value: bool) -> BoxedMatcher {
        struct Constant(bool);
        impl Matcher for Constant {
            fn matches(&self, _f: &Frame, _s: &Session) -> Result<bool> {
                Ok(self.0)
            }
        }
        Box::new(Constant(value))
    }

    #[test]
    fn test_pixel_match_with_tolerance_and_alternatives() {
        let session = test_session();
        let mut frame = Frame::solid(DIMS, Color::new(0, 0, 0));
        let p = Point::new(399, 696);
        frame.set_pixel(p, Color::new(17, 203, 244));

        let hit = pixel_match(p, vec![Color::new(20, 200, 240)]);
        assert!(hit.matches(&frame, &session).unwrap());

        let miss = pixel_match(p, vec![Color::new(200, 200, 240)]);
        assert!(!miss.matches(&frame, &session).unwrap());

        // Match succeeds if any alternative color matches
        let either = pixel_match(p, vec![Color::new(200, 0, 0), Color::new(17, 203, 244)]);
        assert!(either.matches(&frame, &session).unwrap());

        // A per-call tolerance overrides the default in both directions:
        // (20, 200, 240) is within the default tolerance but not 2, and
        // (30, 210, 250) is outside the default but within 15
        let strict = pixel_match_tol(p, vec![Color::new(20, 200, 240)], 2);
        assert!(!strict.matches(&frame, &session).unwrap());
        let loose = pixel_match_tol(p, vec![Color::new(30, 210, 250)], 15);
        assert!(loose.matches(&frame, &session).unwrap());
    }

    #[test]
    fn test_pixel_match_normalizes_point() {
        let session = test_session();
        // Frame at half the reference resolution
        let mut frame = Frame::solid(Dims::new(360, 640), Color::new(0, 0, 0));
        frame.set_pixel(Point::new(50, 100), Color::new(9, 9, 9));

        let m = pixel_match(Point::new(100, 200), vec![Color::new(9, 9, 9)]);
        assert!(m.matches(&frame, &session).unwrap());
    }

    #[test]
    fn test_all_match_short_circuits() {
        let session = test_session();
        let frame = Frame::solid(DIMS, Color::new(0, 0, 0));
        let m = all_match(vec![constant(false), Box::new(MustNotEvaluate)]);
        assert!(!m.matches(&frame, &session).unwrap());
    }

    #[test]
    fn test_any_match_short_circuits() {
        let session = test_session();
        let frame = Frame::solid(DIMS, Color::new(0, 0, 0));
        let m = any_match(vec![constant(true), Box::new(MustNotEvaluate)]);
        assert!(m.matches(&frame, &session).unwrap());
    }

    #[test]
    fn test_combinator_results() {
        let session = test_session();
        let frame = Frame::solid(DIMS, Color::new(0, 0, 0));
        assert!(all_match(vec![constant(true), constant(true)])
            .matches(&frame, &session)
            .unwrap());
        assert!(!any_match(vec![constant(false), constant(false)])
            .matches(&frame, &session)
            .unwrap());
        assert!(all_match(vec![]).matches(&frame, &session).unwrap());
        assert!(!any_match(vec![]).matches(&frame, &session).unwrap());
        assert!(always_matches().matches(&frame, &session).unwrap());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  You weren't\nable  to join. \n"),
            "You weren't able to join."
        );
    }
}
