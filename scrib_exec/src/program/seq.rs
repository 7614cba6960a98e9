//! # Sequence programs
//!
//! A sequence program is a fixed table of entries, each pairing an instruction with the condition
//! that ends it. The program performs the current entry's instruction until its condition holds,
//! then moves on to the next entry, wrapping back to the first after the last.
//!
//! Sequence programs keep no other state, so they suit simple fixed choreographies. The
//! `seq:next` command skips straight to the next entry, which is the only way past a
//! [`Condition::Never`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::cmd::Cmd;
use log::{debug, trace};

use super::{
    mode::ModeTimer,
    param_store::{ANGLE_PER_SECOND, DISTANCE_PER_SECOND, SPEED},
    ParamStore, Program, ProgramEnv, ProgramError,
};
use crate::robot::{self, RobotHandle};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Command which advances to the next entry regardless of the current condition.
pub const NEXT_CMD: &str = "seq:next";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motion performed by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Forward,
    Backward,
    RotateCcw,
    RotateCw,
    Stop,
}

/// Condition ending an entry, measured from the start of the entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// Average obstacle reading is above the value
    ObstacleAbove(f64),

    /// Average obstacle reading is below the value
    ObstacleBelow(f64),

    /// Seconds
    Elapsed(f64),

    /// Centimetres
    Travelled(f64),

    /// Degrees
    Rotated(f64),

    /// Only advanced by `seq:next`
    Never,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One row of a sequence table.
#[derive(Debug, Clone, Copy)]
pub struct SeqEntry {
    pub instruction: Instruction,
    pub condition: Condition,

    /// Status reported when the entry begins.
    pub status: &'static str,
}

pub struct SeqProgram {
    table: Vec<SeqEntry>,
    index: usize,
    timer: ModeTimer,
    params: ParamStore,
    env: ProgramEnv,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SeqEntry {
    pub const fn new(instruction: Instruction, condition: Condition, status: &'static str) -> Self {
        Self {
            instruction,
            condition,
            status,
        }
    }
}

impl SeqProgram {
    /// Create a stopped program at the first entry of the table.
    pub fn new(env: ProgramEnv, table: &[SeqEntry]) -> Result<Self, ProgramError> {
        if table.is_empty() {
            return Err(ProgramError::EmptySequence);
        }

        Ok(Self {
            table: table.to_vec(),
            index: 0,
            timer: ModeTimer::new(env.clock.now()),
            params: ParamStore::with_base(),
            env,
        })
    }

    /// Index of the current entry.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entry(&self) -> &SeqEntry {
        &self.table[self.index]
    }

    fn elapsed_secs(&self) -> f64 {
        self.timer.elapsed(self.env.clock.now()).as_secs_f64()
    }

    fn condition_holds(&self) -> Result<bool, ProgramError> {
        let speed = self.params.get(SPEED)?;

        let holds = match self.entry().condition {
            Condition::ObstacleAbove(v) => robot::average(&self.env.robot.read_obstacle()?) > v,
            Condition::ObstacleBelow(v) => robot::average(&self.env.robot.read_obstacle()?) < v,
            Condition::Elapsed(t) => self.elapsed_secs() > t,
            Condition::Travelled(d) => {
                self.elapsed_secs() > d / (self.params.get(DISTANCE_PER_SECOND)? * speed)
            }
            Condition::Rotated(a) => {
                self.elapsed_secs() > a / (self.params.get(ANGLE_PER_SECOND)? * speed)
            }
            Condition::Never => false,
        };

        Ok(holds)
    }

    fn perform(&self) -> Result<(), ProgramError> {
        let speed = self.params.get(SPEED)?;
        let robot = &self.env.robot;

        match self.entry().instruction {
            Instruction::Forward => robot.forward(speed)?,
            Instruction::Backward => robot.backward(speed)?,
            Instruction::RotateCcw => robot.rotate(speed)?,
            Instruction::RotateCw => robot.rotate(-speed)?,
            Instruction::Stop => robot.stop()?,
        }

        Ok(())
    }

    /// Move to the next entry, starting its motion unless paused.
    fn advance(&mut self) -> Result<String, ProgramError> {
        self.env.robot.stop()?;

        self.index = (self.index + 1) % self.table.len();
        self.timer.restart(self.env.clock.now());
        debug!("Sequence entry {}: {:?}", self.index, self.entry());

        if !self.timer.is_paused() {
            self.perform()?;
        }

        Ok(self.entry().status.to_string())
    }
}

impl Program for SeqProgram {
    fn start(&mut self) -> Result<(), ProgramError> {
        self.timer.resume(self.env.clock.now());
        self.perform()
    }

    fn stop(&mut self) -> Result<(), ProgramError> {
        self.timer.pause(self.env.clock.now());
        self.env.robot.stop()?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ProgramError> {
        self.env.robot.stop()?;
        self.index = 0;
        self.timer = ModeTimer::new(self.env.clock.now());
        Ok(())
    }

    fn has_started(&self) -> bool {
        self.timer.has_started()
    }

    fn step(&mut self) -> Result<Option<String>, ProgramError> {
        if self.condition_holds()? {
            self.advance().map(Some)
        }
        else {
            trace!("Sequence entry {} continuing", self.index);
            Ok(None)
        }
    }

    fn params(&mut self) -> &mut ParamStore {
        &mut self.params
    }

    fn robot(&self) -> &RobotHandle {
        &self.env.robot
    }

    fn handle_command(&mut self, cmd: &Cmd) -> Result<Option<String>, ProgramError> {
        match cmd {
            Cmd::Custom(text) if text == NEXT_CMD => self.advance().map(Some),
            _ => super::handle_common_cmd(self, cmd),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{program::test_env::TestEnv, robot::Motion};

    const TABLE: &[SeqEntry] = &[
        SeqEntry::new(Instruction::Forward, Condition::Elapsed(2.0), "one"),
        SeqEntry::new(Instruction::RotateCcw, Condition::Never, "two"),
        SeqEntry::new(Instruction::Stop, Condition::ObstacleBelow(10.0), "three"),
    ];

    #[test]
    fn test_empty_table_rejected() {
        let t = TestEnv::new(0.0);
        assert!(matches!(SeqProgram::new(t.env(), &[]), Err(ProgramError::EmptySequence)));
    }

    #[test]
    fn test_never_needs_manual_advance() {
        let t = TestEnv::new(50.0);
        let mut p = SeqProgram::new(t.env(), TABLE).unwrap();
        p.start().unwrap();
        assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.5));

        t.clock.advance_secs(2.5);
        assert_eq!(p.step().unwrap().as_deref(), Some("two"));
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(0.5));

        t.clock.advance_secs(1000.0);
        assert_eq!(p.step().unwrap(), None);
        assert_eq!(p.index(), 1);

        let reply = p.handle_command(&Cmd::parse(NEXT_CMD)).unwrap();
        assert_eq!(reply.as_deref(), Some("three"));
        assert_eq!(t.robot.motion().unwrap(), Motion::Stopped);

        // Wraps once the reading drops
        assert_eq!(p.step().unwrap(), None);
        t.robot.set_obstacle(5.0).unwrap();
        assert_eq!(p.step().unwrap().as_deref(), Some("one"));
        assert_eq!(p.index(), 0);
    }

    #[test]
    fn test_manual_advance_while_stopped_does_not_move() {
        let t = TestEnv::new(50.0);
        let mut p = SeqProgram::new(t.env(), TABLE).unwrap();

        p.handle_command(&Cmd::parse(NEXT_CMD)).unwrap();
        assert_eq!(p.index(), 1);
        assert_eq!(t.robot.motion().unwrap(), Motion::Stopped);

        p.start().unwrap();
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(0.5));
    }

    #[test]
    fn test_pause_freezes_elapsed_condition() {
        let t = TestEnv::new(50.0);
        let mut p = SeqProgram::new(t.env(), TABLE).unwrap();
        p.start().unwrap();

        t.clock.advance_secs(1.5);
        p.stop().unwrap();
        t.clock.advance_secs(60.0);
        p.start().unwrap();

        assert_eq!(p.step().unwrap(), None);
        t.clock.advance_secs(0.6);
        assert_eq!(p.step().unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_reset_returns_to_first_entry() {
        let t = TestEnv::new(50.0);
        let mut p = SeqProgram::new(t.env(), TABLE).unwrap();
        p.start().unwrap();
        t.clock.advance_secs(2.5);
        p.step().unwrap();

        p.stop().unwrap();
        assert!(p.has_started());
        p.reset().unwrap();
        assert!(!p.has_started());
        assert_eq!(p.index(), 0);
        assert_eq!(p.entry().status, "one");
    }
}
