//! # Programs
//!
//! A program is the behaviour the controller drives. The controller calls [`Program::step`] on a
//! fixed cadence while the program is running, and passes on any command it doesn't handle itself
//! to [`Program::handle_command`].
//!
//! Two engines are provided for writing programs:
//! - [`mode`] - timed finite state machines, where each mode is one motion that lasts until some
//!   elapsed time, distance, or rotation has been reached. [`Avoider`], [`Square`], and
//!   [`Tracie`] are built on this.
//! - [`seq`] - a fixed table of instructions and conditions cycled through in order. [`bounce`]
//!   is built on this.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod avoider;
pub mod bounce;
pub mod mode;
pub mod param_store;
pub mod registry;
pub mod seq;
pub mod square;
pub mod tracie;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::cmd::Cmd;

use crate::{
    clock::ClockHandle,
    robot::{RobotError, RobotHandle},
};

pub use avoider::Avoider;
pub use param_store::{ParamDef, ParamError, ParamStore};
pub use registry::ProgramId;
pub use seq::SeqProgram;
pub use square::Square;
pub use tracie::Tracie;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything a program needs from the outside world.
#[derive(Clone)]
pub struct ProgramEnv {
    pub robot: RobotHandle,
    pub clock: ClockHandle,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("robot error: {0}")]
    Robot(#[from] RobotError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("a sequence program needs at least one entry")]
    EmptySequence,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A behaviour the controller can drive.
///
/// A program is constructed stopped. `start` begins (or resumes) motion and timing, `stop` halts
/// motion and freezes timing, and `reset` returns the program to its constructed state. The
/// controller never calls `step` while the program is stopped.
pub trait Program: Send {
    /// Begin or resume the program.
    fn start(&mut self) -> Result<(), ProgramError>;

    /// Pause the program.
    fn stop(&mut self) -> Result<(), ProgramError>;

    /// Return to the constructed state. Parameter values are kept.
    fn reset(&mut self) -> Result<(), ProgramError>;

    /// True if the program has been started since it was constructed or last reset.
    fn has_started(&self) -> bool;

    /// Advance the program by one tick, returning a status message if something changed.
    fn step(&mut self) -> Result<Option<String>, ProgramError>;

    /// The program's tunable parameters.
    fn params(&mut self) -> &mut ParamStore;

    /// The robot the program is driving.
    fn robot(&self) -> &RobotHandle;

    /// Handle a command the controller didn't handle itself.
    ///
    /// `Ok(None)` means the command wasn't understood.
    fn handle_command(&mut self, cmd: &Cmd) -> Result<Option<String>, ProgramError> {
        handle_common_cmd(self, cmd)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Handle the commands every program supports: `other:beep`, `other:info`, and `set:`.
pub fn handle_common_cmd<P>(program: &mut P, cmd: &Cmd) -> Result<Option<String>, ProgramError>
where
    P: Program + ?Sized,
{
    match cmd {
        Cmd::Beep => {
            program.robot().beep()?;
            Ok(Some(String::from("beep")))
        }
        Cmd::Info => Ok(Some(program.robot().info()?)),
        Cmd::Set { code, value } => Ok(Some(program.params().apply(code, value)?)),
        _ => Ok(None),
    }
}

// ------------------------------------------------------------------------------------------------
// TEST HELPERS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::Arc;

    use super::ProgramEnv;
    use crate::{clock::ManualClock, robot::NullRobot};

    /// A program environment with handles kept for driving the robot and clock by hand.
    pub struct TestEnv {
        pub robot: Arc<NullRobot>,
        pub clock: Arc<ManualClock>,
    }

    impl TestEnv {
        pub fn new(obstacle: f64) -> Self {
            Self {
                robot: Arc::new(NullRobot::new(obstacle)),
                clock: Arc::new(ManualClock::new()),
            }
        }

        pub fn env(&self) -> ProgramEnv {
            ProgramEnv {
                robot: self.robot.clone(),
                clock: self.clock.clone(),
            }
        }
    }
}
