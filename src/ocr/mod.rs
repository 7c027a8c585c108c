//! Text recognition via the external tesseract engine.
//!
//! This module provides:
//! - A startup availability check (`require_tesseract`)
//! - Recognition over a preprocessed grayscale crop (`recognize`)
//!
//! Tesseract availability is a fatal precondition: it is verified once
//! before any hardware interaction begins, so the automaton never runs with
//! a broken text matcher.

pub mod engine;
pub mod setup;

pub use engine::recognize;
pub use setup::require_tesseract;
