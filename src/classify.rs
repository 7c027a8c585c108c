//! Tera-type classification against a template image catalog.
//!
//! A directory holds one reference screenshot per type. Each reference (and
//! the live frame) is reduced to a binary mask: the fixed type-icon crop,
//! thresholded around the icon's marker color. The best-matching category is
//! the one whose mask agrees with the live mask on the largest fraction of
//! pixels. This is a one-shot helper consumed by data-dependent actions, not
//! part of the runner loop.

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fs;
use std::path::Path;

use crate::capture::Frame;
use crate::color::Color;
use crate::geometry::{Dims, Point};

/// Corners of the type icon, on the reference grid.
pub const TYPE_CROP_TOP_LEFT: Point = Point::new(68, 604);
pub const TYPE_CROP_BOTTOM_RIGHT: Point = Point::new(131, 657);

/// Marker color of the icon artwork, and the band around it kept in the mask.
const MASK_COLOR: Color = Color::new(71, 51, 39);
const MASK_TOLERANCE: u8 = 20;

/// Reference images loaded once from a directory, one per category.
pub struct TemplateCatalog {
    entries: Vec<(String, RgbImage)>,
}

impl TemplateCatalog {
    /// Loads every image in `dir`; the file stem is the category name.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("reading template directory {}", dir.display()))?
        {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let name = match path.file_stem() {
                Some(stem) => stem.to_string_lossy().into_owned(),
                None => continue,
            };
            let img = image::open(&path)
                .with_context(|| format!("loading template {}", path.display()))?
                .to_rgb8();
            entries.push((name, img));
        }
        if entries.is_empty() {
            return Err(anyhow!("no template images in {}", dir.display()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        crate::log(&format!(
            "loaded {} type templates from {}",
            entries.len(),
            dir.display()
        ));
        Ok(Self { entries })
    }

    /// Returns the best-matching category for the live frame, with the
    /// fraction of mask pixels that agreed.
    pub fn classify(&self, frame: &Frame) -> Result<(String, f64)> {
        let dims = frame.dims();
        let live = type_mask(frame);

        let mut best: Option<(String, f64)> = None;
        for (name, img) in &self.entries {
            let resized = resize_to(img, dims);
            let score = agreement(&live, &type_mask(&resized));
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((name.clone(), score));
            }
        }
        best.ok_or_else(|| anyhow!("template catalog is empty"))
    }
}

/// Rescales a reference image to the live frame's dimensions and converts it
/// to the frame's BGR layout, so both sides crop identically.
fn resize_to(img: &RgbImage, dims: Dims) -> Frame {
    let resized = imageops::resize(img, dims.width, dims.height, FilterType::Triangle);
    let mut data = Vec::with_capacity((dims.height * dims.width * 3) as usize);
    for pixel in resized.pixels() {
        data.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }
    Frame::from_bgr(dims.height, dims.width, data)
}

/// The type-icon crop reduced to a binary mask around the marker color.
fn type_mask(frame: &Frame) -> Vec<bool> {
    let dims = frame.dims();
    let crop = frame.crop(
        TYPE_CROP_TOP_LEFT.norm(dims),
        TYPE_CROP_BOTTOM_RIGHT.norm(dims),
    );
    let crop_dims = crop.dims();
    let mut mask = Vec::with_capacity((crop_dims.height * crop_dims.width) as usize);
    for y in 0..crop_dims.height {
        for x in 0..crop_dims.width {
            mask.push(
                crop.pixel(Point::new(y, x))
                    .within_tolerance(MASK_COLOR, MASK_TOLERANCE),
            );
        }
    }
    mask
}

/// Fraction of positions where two equal-length masks agree.
fn agreement(a: &[bool], b: &[bool]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let matching = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matching as f64 / a.len() as f64
}
