//! Runtime configuration.
//!
//! Loads settings from a JSON file at startup. Provides the serial device
//! path, capture device geometry, and the template catalog location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<BotConfig> = OnceLock::new();

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    /// Serial device the button emulator is attached to.
    #[serde(default = "default_serial_device")]
    pub serial_device: String,
    /// Capture device index.
    #[serde(default)]
    pub capture_index: i32,
    /// Width the capture device is configured to.
    #[serde(default = "default_capture_width")]
    pub capture_width: u32,
    /// Height the capture device is configured to.
    #[serde(default = "default_capture_height")]
    pub capture_height: u32,
    /// Maximum time to wait for a frame before a capture error (milliseconds).
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
    /// Directory of tera-type reference images.
    #[serde(default = "default_types_dir")]
    pub types_dir: String,
}

fn default_serial_device() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_capture_width() -> u32 {
    1280
}

fn default_capture_height() -> u32 {
    720
}

fn default_capture_timeout_ms() -> u64 {
    5000
}

fn default_types_dir() -> String {
    "types".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            serial_device: default_serial_device(),
            capture_index: 0,
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            capture_timeout_ms: default_capture_timeout_ms(),
            types_dir: default_types_dir(),
        }
    }
}

/// Loads configuration from the given path, or defaults when absent.
fn load_config(path: &Path) -> BotConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log(&format!("config loaded from {}", path.display()));
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
            }
        }
    } else {
        crate::log(&format!(
            "{} not found. Using default config.",
            path.display()
        ));
    }

    BotConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config(path: &Path) {
    let _ = CONFIG.set(load_config(path));
}

/// Returns a reference to the global configuration.
/// Panics if called before `init_config()`.
pub fn get_config() -> &'static BotConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}
