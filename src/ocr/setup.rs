//! Tesseract availability checking.

use anyhow::{anyhow, Result};
use std::process::Command;

/// Verifies tesseract is runnable. Call once at startup, before opening the
/// serial link; a missing OCR engine aborts the run up front.
pub fn require_tesseract() -> Result<()> {
    let output = Command::new("tesseract")
        .arg("--version")
        .output()
        .map_err(|e| anyhow!("tesseract not found in PATH: {}", e))?;

    if !output.status.success() {
        return Err(anyhow!(
            "tesseract --version failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let version = String::from_utf8_lossy(&output.stdout);
    let first_line = version.lines().next().unwrap_or("unknown");
    crate::log(&format!("found {}", first_line.trim()));
    Ok(())
}
