//! padbot - frame-driven console automation.
//!
//! Watches live video of a console's screen and reacts by sending discrete
//! button presses to an external hardware button-emulator over a serial link.
//! The core is a polling automaton: capture a frame, evaluate the current
//! state's rules in order, execute the first matching rule's action, move to
//! its declared next state.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

pub mod action;
pub mod bot;
pub mod capture;
pub mod classify;
pub mod color;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod link;
pub mod matcher;
pub mod ocr;

const LOG_FILE: &str = "padbot.log";

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(LOG_FILE) {
        let _ = file.write_all(line.as_bytes());
    }
}
