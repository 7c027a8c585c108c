//! Serial channel to the button-emulator hardware.
//!
//! Each button maps to a single ASCII byte understood by the emulator
//! firmware; the byte `'0'` releases whatever is held. The link is a scoped
//! resource: dropping it releases any held button so the physical controller
//! never stays pressed after a crash or abort.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

/// Byte that releases all held buttons.
pub const RELEASE: u8 = b'0';

/// Baud rate agreed with the emulator firmware.
pub const BAUD_RATE: u32 = 9600;

/// The finite alphabet of buttons the firmware understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    X,
    Y,
    L,
    R,
    Plus,
    Minus,
    Home,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    /// The firmware byte for this button.
    pub fn byte(self) -> u8 {
        match self {
            Button::A => b'A',
            Button::B => b'B',
            Button::X => b'X',
            Button::Y => b'Y',
            Button::L => b'L',
            Button::R => b'R',
            Button::Plus => b'+',
            Button::Minus => b'-',
            Button::Home => b'H',
            // Left stick directions
            Button::Up => b'w',
            Button::Down => b's',
            Button::Left => b'a',
            Button::Right => b'd',
        }
    }
}

/// The channel button-press commands are transmitted over.
pub trait ButtonLink {
    /// Writes exactly these bytes to the hardware.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// A live serial connection to the emulator hardware.
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLink {
    /// Opens the serial device at the firmware baud rate.
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_secs(1))
            .open()
            .with_context(|| format!("opening serial device {}", path))?;
        Ok(Self { port })
    }
}

impl ButtonLink for SerialLink {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port
            .write_all(bytes)
            .context("writing to serial device")?;
        self.port.flush().context("flushing serial device")?;
        Ok(())
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        // Leave the pad in a neutral state on every exit path.
        let _ = self.port.write_all(&[RELEASE]);
        let _ = self.port.flush();
    }
}

/// Shared log of byte sequences a `RecordingLink` has sent.
///
/// The runner owns its link, so observers keep a clone of this handle.
pub type SentLog = Rc<RefCell<Vec<Vec<u8>>>>;

/// Records sent byte sequences instead of transmitting them.
///
/// Used by tests and `--dry-run` to observe the exact command stream.
pub struct RecordingLink {
    sent: SentLog,
    announce: bool,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self {
            sent: SentLog::default(),
            announce: false,
        }
    }

    /// A recording link appending to a caller-held log.
    pub fn with_log(sent: SentLog) -> Self {
        Self {
            sent,
            announce: false,
        }
    }

    /// A recording link that also logs each send (dry-run mode).
    pub fn announcing() -> Self {
        Self {
            sent: SentLog::default(),
            announce: true,
        }
    }
}

impl Default for RecordingLink {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonLink for RecordingLink {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.announce {
            crate::log(&format!(
                "dry-run send: {:?}",
                String::from_utf8_lossy(bytes)
            ));
        }
        self.sent.borrow_mut().push(bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_bytes_are_distinct() {
        let all = [
            Button::A,
            Button::B,
            Button::X,
            Button::Y,
            Button::L,
            Button::R,
            Button::Plus,
            Button::Minus,
            Button::Home,
            Button::Up,
            Button::Down,
            Button::Left,
            Button::Right,
        ];
        for (i, a) in all.iter().enumerate() {
            assert_ne!(a.byte(), RELEASE, "{:?} collides with release byte", a);
            for b in &all[i + 1..] {
                assert_ne!(a.byte(), b.byte(), "{:?} and {:?} share a byte", a, b);
            }
        }
    }

    #[test]
    fn test_recording_link_preserves_order() {
        let log = SentLog::default();
        let mut link = RecordingLink::with_log(log.clone());
        link.send(&[Button::A.byte()]).unwrap();
        link.send(&[RELEASE]).unwrap();
        assert_eq!(*log.borrow(), vec![vec![b'A'], vec![b'0']]);
    }
}
