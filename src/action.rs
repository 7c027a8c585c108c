//! Timed, hardware-affecting units of work.
//!
//! Presses and waits are the primitives; `do_all` composes them into a
//! compound action that runs to completion before the rule's transition is
//! taken. Presses are real physical side effects, so nothing here retries
//! implicitly - retry policy belongs in the state table as ordinary
//! self-looping rules.

use anyhow::Result;
use std::thread;
use std::time::Duration;

use crate::engine::Session;
use crate::link::{Button, RELEASE};

/// How long a press byte is held before the release byte, by default.
pub const DEFAULT_HOLD_MS: u64 = 100;
/// Settle delay after the release byte so the firmware registers distinct
/// presses.
pub const DEFAULT_SETTLE_MS: u64 = 75;

/// A unit of work executed once a rule fires. Runs synchronously and blocks
/// the runner until complete; may capture frames, press buttons, and mutate
/// session scratch state.
pub trait Action {
    fn execute(&self, session: &mut Session) -> Result<()>;
}

pub type BoxedAction = Box<dyn Action>;

struct Press {
    button: Button,
    hold: Duration,
    settle: Duration,
}

impl Action for Press {
    fn execute(&self, session: &mut Session) -> Result<()> {
        session.link.send(&[self.button.byte()])?;
        thread::sleep(self.hold);
        session.link.send(&[RELEASE])?;
        thread::sleep(self.settle);
        Ok(())
    }
}

/// Presses a single button: press byte, hold, release byte, settle.
pub fn press(button: Button) -> BoxedAction {
    press_timed(button, DEFAULT_HOLD_MS, DEFAULT_SETTLE_MS)
}

/// `press` with explicit hold and settle durations in milliseconds.
pub fn press_timed(button: Button, hold_ms: u64, settle_ms: u64) -> BoxedAction {
    Box::new(Press {
        button,
        hold: Duration::from_millis(hold_ms),
        settle: Duration::from_millis(settle_ms),
    })
}

struct Wait {
    duration: Duration,
}

impl Action for Wait {
    fn execute(&self, _session: &mut Session) -> Result<()> {
        thread::sleep(self.duration);
        Ok(())
    }
}

/// Suspends execution for the given duration without sending input.
///
/// A blocking sleep of the single thread: deliberately nothing else happens
/// while the automaton pauses.
pub fn wait(seconds: f64) -> BoxedAction {
    Box::new(Wait {
        duration: Duration::from_secs_f64(seconds),
    })
}

struct Sequence {
    actions: Vec<BoxedAction>,
}

impl Action for Sequence {
    fn execute(&self, session: &mut Session) -> Result<()> {
        for action in &self.actions {
            action.execute(session)?;
        }
        Ok(())
    }
}

/// Executes each sub-action in order, synchronously.
pub fn do_all(actions: Vec<BoxedAction>) -> BoxedAction {
    Box::new(Sequence { actions })
}
