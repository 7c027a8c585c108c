//! The state machine runner - the core automation loop.
//!
//! Given a table mapping state name to an ordered list of
//! (predicate, action, next-state) rules, the runner repeatedly captures a
//! frame, evaluates the current state's rules in declaration order, executes
//! the first matching rule's action synchronously, and moves to its declared
//! next state. If no rule matches, the state holds and the loop re-polls -
//! that is how a state waits for a visual condition.
//!
//! Strictly single-threaded and synchronous: waits are blocking sleeps, OCR
//! blocks the loop, and a rule's action is fully applied before the next
//! frame is captured.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;

use crate::action::BoxedAction;
use crate::capture::FrameSource;
use crate::color::Color;
use crate::link::ButtonLink;
use crate::matcher::BoxedMatcher;

/// Everything a run owns: the frame source, the serial link, and the scratch
/// state actions leave behind for later predicates.
///
/// Both devices are owned exclusively for the run's duration; nothing else
/// writes to the link concurrently.
pub struct Session {
    pub source: Box<dyn FrameSource>,
    pub link: Box<dyn ButtonLink>,
    /// Marker color remembered by a data-dependent action (for example the
    /// raid stripe color) so a later predicate can watch for it to disappear.
    pub marker_color: Option<Color>,
}

impl Session {
    pub fn new(source: Box<dyn FrameSource>, link: Box<dyn ButtonLink>) -> Self {
        Self {
            source,
            link,
            marker_color: None,
        }
    }
}

/// One (predicate, action, next-state) entry in a state's ordered rule list.
pub struct Rule {
    pub when: BoxedMatcher,
    pub then: BoxedAction,
    pub goto: String,
}

impl Rule {
    pub fn new(when: BoxedMatcher, then: BoxedAction, goto: &str) -> Self {
        Self {
            when,
            then,
            goto: goto.to_string(),
        }
    }
}

/// Mapping from state name to its ordered rule list.
///
/// Built once before the run starts and read-only thereafter. Priority
/// between simultaneously-true predicates is encoded by list order: the
/// author puts specific cases before generic fallbacks.
#[derive(Default)]
pub struct StateTable {
    states: HashMap<String, Vec<Rule>>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, rules: Vec<Rule>) {
        self.states.insert(name.to_string(), rules);
    }

    pub fn get(&self, name: &str) -> Option<&[Rule]> {
        self.states.get(name).map(|r| r.as_slice())
    }
}

/// The control loop tying capture, rule evaluation, action execution, and
/// state transition together.
pub struct Runner {
    table: StateTable,
    session: Session,
    current: String,
}

impl Runner {
    pub fn new(table: StateTable, session: Session, initial: &str) -> Self {
        Self {
            table,
            session,
            current: initial.to_string(),
        }
    }

    pub fn current_state(&self) -> &str {
        &self.current
    }

    /// One poll-and-react cycle: capture, evaluate in order, act, transition.
    ///
    /// Capture failure is fatal - the loop cannot proceed without a frame,
    /// so the error propagates instead of being skipped. A reference to a
    /// state name the table does not contain fails loudly here, the first
    /// time it is looked up.
    pub fn step(&mut self) -> Result<()> {
        let frame = self
            .session
            .source
            .capture()
            .context("capturing frame for rule evaluation")?;

        let rules = match self.table.get(&self.current) {
            Some(rules) => rules,
            None => bail!("state table has no state named {:?}", self.current),
        };

        for rule in rules {
            if rule.when.matches(&frame, &self.session)? {
                rule.then.execute(&mut self.session)?;
                if rule.goto != self.current {
                    crate::log(&format!("{} -> {}", self.current, rule.goto));
                    self.current = rule.goto.clone();
                }
                return Ok(());
            }
        }

        // No rule matched: defined behavior, state holds and we re-poll.
        Ok(())
    }

    /// Runs until an unrecoverable error or external termination.
    pub fn run(&mut self) -> Result<()> {
        crate::log(&format!("starting in state {}", self.current));
        loop {
            self.step()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{press_timed, wait};
    use crate::capture::{CaptureError, Frame, ReplaySource};
    use crate::color::Color;
    use crate::geometry::{Dims, Point};
    use crate::link::{Button, RecordingLink, SentLog};
    use crate::matcher::{always_matches, pixel_match};

    const DIMS: Dims = Dims {
        height: 720,
        width: 1280,
    };

    fn session_with(source: ReplaySource, log: SentLog) -> Session {
        Session::new(Box::new(source), Box::new(RecordingLink::with_log(log)))
    }

    #[test]
    fn test_self_loop_is_stable() {
        let source = ReplaySource::new(vec![Frame::solid(DIMS, Color::new(0, 0, 0))]);
        let mut table = StateTable::new();
        table.add("A", vec![Rule::new(always_matches(), wait(0.0), "A")]);

        let mut runner = Runner::new(table, session_with(source, SentLog::default()), "A");
        for _ in 0..50 {
            runner.step().expect("self-loop step failed");
            assert_eq!(runner.current_state(), "A");
        }
    }

    #[test]
    fn test_polls_until_predicate_true() {
        // k frames without the target pixel, then one with it
        let k = 4;
        let target = Point::new(10, 10);
        let red = Color::new(0, 0, 255);
        let blank = Frame::solid(DIMS, Color::new(0, 0, 0));
        let mut lit = blank.clone();
        lit.set_pixel(target, red);

        let mut frames = vec![blank; k];
        frames.push(lit);
        let source = ReplaySource::new(frames);
        let captures = source.capture_count();

        let mut table = StateTable::new();
        table.add(
            "A",
            vec![Rule::new(pixel_match(target, vec![red]), wait(0.0), "B")],
        );
        table.add("B", vec![]);

        let mut runner = Runner::new(table, session_with(source, SentLog::default()), "A");
        while runner.current_state() == "A" {
            runner.step().unwrap();
        }
        assert_eq!(runner.current_state(), "B");
        assert_eq!(captures.get(), k + 1, "expected exactly k+1 captures");
    }

    #[test]
    fn test_end_to_end_press_once_then_settle() {
        let target = Point::new(10, 10);
        let red = Color::new(255, 0, 0);
        let mut frame = Frame::solid(DIMS, Color::new(0, 0, 0));
        frame.set_pixel(target, red);

        let source = ReplaySource::new(vec![frame]);
        let log = SentLog::default();

        let mut table = StateTable::new();
        table.add(
            "START",
            vec![Rule::new(
                pixel_match(target, vec![red]),
                press_timed(Button::A, 0, 0),
                "END",
            )],
        );
        table.add("END", vec![Rule::new(always_matches(), wait(0.0), "END")]);

        let mut runner = Runner::new(table, session_with(source, log.clone()), "START");
        for _ in 0..10 {
            runner.step().unwrap();
        }

        assert_eq!(runner.current_state(), "END");
        // Exactly one press: one press byte, one release byte
        assert_eq!(*log.borrow(), vec![vec![b'A'], vec![b'0']]);
    }

    #[test]
    fn test_no_matching_rule_holds_state() {
        // A state table whose only rule never fires: the authoring-risk case.
        // The runner polls forever rather than erroring out.
        let source = ReplaySource::new(vec![Frame::solid(DIMS, Color::new(0, 0, 0))]);
        let mut table = StateTable::new();
        table.add(
            "STUCK",
            vec![Rule::new(
                pixel_match(Point::new(0, 0), vec![Color::new(255, 255, 255)]),
                wait(0.0),
                "NEVER",
            )],
        );

        let log = SentLog::default();
        let mut runner = Runner::new(table, session_with(source, log.clone()), "STUCK");
        for _ in 0..20 {
            runner.step().unwrap();
            assert_eq!(runner.current_state(), "STUCK");
        }
        assert!(log.borrow().is_empty(), "no action should have run");
    }

    #[test]
    fn test_capture_failure_propagates() {
        struct DyingSource;
        impl FrameSource for DyingSource {
            fn capture(&mut self) -> Result<Frame, CaptureError> {
                Err(CaptureError::new("device unplugged"))
            }
        }

        let mut table = StateTable::new();
        table.add("A", vec![Rule::new(always_matches(), wait(0.0), "A")]);
        let session = Session::new(Box::new(DyingSource), Box::new(RecordingLink::new()));
        let mut runner = Runner::new(table, session, "A");

        let err = runner.step().unwrap_err();
        assert!(
            format!("{:#}", err).contains("device unplugged"),
            "error chain should carry the capture reason: {:#}",
            err
        );
    }

    #[test]
    fn test_unknown_state_fails_loudly() {
        let source = ReplaySource::new(vec![Frame::solid(DIMS, Color::new(0, 0, 0))]);
        let mut table = StateTable::new();
        table.add("A", vec![Rule::new(always_matches(), wait(0.0), "MISSING")]);

        let mut runner = Runner::new(table, session_with(source, SentLog::default()), "A");
        runner.step().unwrap();
        assert_eq!(runner.current_state(), "MISSING");

        let err = runner.step().unwrap_err();
        assert!(
            err.to_string().contains("MISSING"),
            "error should name the missing state: {}",
            err
        );
    }
}
