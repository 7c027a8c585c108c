//! Serial pass-through debug utility.
//!
//! Hand-drives the emulator firmware without the automation engine: any
//! bytes written to a file named `f` in the working directory are relayed to
//! the serial device (and the file removed), and everything the device sends
//! back is echoed to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use padbot::link::BAUD_RATE;

#[derive(Parser)]
#[command(name = "serial_debug", about = "Byte relay to the button-emulator firmware")]
struct Args {
    /// Serial device to relay to
    device: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut port = serialport::new(&args.device, BAUD_RATE)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("opening serial device {}", args.device))?;

    let trigger = Path::new("f");
    let mut stdout = io::stdout();
    let mut buf = [0u8; 256];

    loop {
        if trigger.exists() {
            let contents = fs::read(trigger)?;
            fs::remove_file(trigger)?;
            port.write_all(&contents)?;
            port.flush()?;
            stdout.write_all(b"> send: ")?;
            stdout.write_all(&contents)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
        } else if port.bytes_to_read()? > 0 {
            let n = port.read(&mut buf)?;
            stdout.write_all(&buf[..n])?;
            stdout.flush()?;
        } else {
            thread::sleep(Duration::from_millis(10));
        }
    }
}
