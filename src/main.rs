//! padbot entry point.
//!
//! Verifies the OCR precondition, loads configuration and the type template
//! catalog, opens the capture device and the serial link, and hands control
//! to the raid state machine until the process is terminated.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use padbot::classify::TemplateCatalog;
use padbot::config::{self, BotConfig};
use padbot::engine::{Runner, Session};
use padbot::link::{ButtonLink, RecordingLink, SerialLink, BAUD_RATE};
use padbot::{bot, capture, log, ocr};

#[derive(Parser)]
#[command(name = "padbot", about = "Frame-driven raid automation over a serial button emulator")]
struct Args {
    /// Serial device of the button emulator (overrides the config file)
    #[arg(long)]
    serial: Option<String>,

    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Log button commands instead of sending them to hardware
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    config::init_config(&args.config);
    let cfg = config::get_config();

    // Fail fast before any hardware interaction if OCR is unavailable
    ocr::require_tesseract()?;

    let catalog = TemplateCatalog::load(Path::new(&cfg.types_dir))?;

    let link: Box<dyn ButtonLink> = if args.dry_run {
        log("dry run: commands will be logged, not sent");
        Box::new(RecordingLink::announcing())
    } else {
        let device = args.serial.as_deref().unwrap_or(&cfg.serial_device);
        log(&format!("opening serial link on {}", device));
        Box::new(SerialLink::open(device, BAUD_RATE)?)
    };

    let source = open_source(cfg)?;
    let session = Session::new(source, link);
    let states = bot::raid::build_states(catalog);

    let mut runner = Runner::new(states, session, "INITIAL");
    runner.run()
}

#[cfg(feature = "camera")]
fn open_source(cfg: &BotConfig) -> Result<Box<dyn capture::FrameSource>> {
    use std::time::Duration;

    log(&format!(
        "opening capture device {} at {}x{}",
        cfg.capture_index, cfg.capture_width, cfg.capture_height
    ));
    let source = capture::CameraSource::open(
        cfg.capture_index,
        cfg.capture_width,
        cfg.capture_height,
        Duration::from_millis(cfg.capture_timeout_ms),
    )?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "camera"))]
fn open_source(_cfg: &BotConfig) -> Result<Box<dyn capture::FrameSource>> {
    anyhow::bail!("built without the camera feature; rebuild with `--features camera`")
}
