//! Tesseract invocation on a preprocessed grayscale crop.

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::process::Command;
use tempfile::NamedTempFile;

/// Runs tesseract over a grayscale image and returns the raw recognized text.
///
/// The image is written to a temporary PNG and tesseract prints to stdout;
/// `--psm 6` assumes a single uniform block of text, which fits the cropped
/// dialog regions matchers hand us.
pub fn recognize(img: &GrayImage) -> Result<String> {
    let temp_input = NamedTempFile::with_suffix(".png")?;
    img.save(temp_input.path())
        .context("saving OCR input image")?;

    let output = Command::new("tesseract")
        .arg(temp_input.path())
        .arg("stdout")
        .arg("-l")
        .arg("eng")
        .arg("--psm")
        .arg("6")
        .output()
        .context("running tesseract")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
