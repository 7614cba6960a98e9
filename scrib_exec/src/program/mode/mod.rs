//! # Mode engine
//!
//! Machinery for programs built as timed finite state machines. Each mode is a single motion
//! (drive forwards, rotate clockwise, ...) which lasts until the program decides some threshold of
//! time, distance, or rotation has been crossed, at which point it moves to another mode.
//!
//! A program implements [`ModeProgram`], which gives it the threshold predicates and hooks, and
//! then implements [`Program`](super::Program) by delegating to the lifecycle functions here
//! ([`start`], [`stop`], [`reset`], [`step`]).
//!
//! Distances and angles are turned into durations using the `distance_per_second` and
//! `angle_per_second` parameters scaled by the program's current nominal speed, i.e. "has the
//! motion at this speed for this long covered the distance?". Nothing is measured.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod timer;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt::Debug, time::Duration};

use log::debug;

pub use timer::ModeTimer;

use super::{
    param_store::{ANGLE_PER_SECOND, DISTANCE_PER_SECOND, SPEED},
    ParamStore, ProgramEnv, ProgramError,
};
use crate::robot::{self, RobotHandle};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Status reported when a program restarts itself from the beginning.
pub const RESTART_STATUS: &str = "restarting program";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The motion associated with a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    /// Rotate counter-clockwise, relative to the program's rotation sign
    Ccw,
    /// Rotate clockwise, relative to the program's rotation sign
    Cw,
    /// Stand still
    Halt,
}

/// The decision a program makes on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next<M> {
    /// Stay in the current mode
    Stay,

    /// Move to the given mode
    Goto(M),

    /// Reset the program and begin again from the start
    Restart,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Identifier of one mode of a program.
pub trait ModeId: Copy + Eq + Debug + Send {
    /// The motion performed in this mode.
    fn direction(self) -> Direction;

    /// Status message reported when this mode begins.
    fn status(self) -> &'static str;
}

/// A program built from timed modes.
pub trait ModeProgram: Send {
    type Mode: ModeId;

    fn core(&self) -> &ModeCore<Self::Mode>;

    fn core_mut(&mut self) -> &mut ModeCore<Self::Mode>;

    /// Decide what to do on this tick.
    ///
    /// Called with `core().mode() == None` on the first tick after construction or reset.
    fn next_mode(&mut self) -> Result<Next<Self::Mode>, ProgramError>;

    /// Nominal speed in the current mode.
    fn speed(&self) -> Result<f64, ProgramError> {
        Ok(self.core().params.get(SPEED)?)
    }

    /// Sign applied to rotations, +1.0 means `Ccw` modes really turn counter-clockwise.
    fn rotation_sign(&self) -> f64 {
        1.0
    }

    /// Factor applied to the time a rotation is expected to take in the current mode.
    fn rotation_factor(&self) -> Result<f64, ProgramError> {
        Ok(1.0)
    }

    /// Called with the mode being left still current, before switching.
    fn end_mode(&mut self) -> Result<(), ProgramError> {
        Ok(())
    }

    /// Called with the new mode current, before its motion starts.
    fn begin_mode(&mut self) -> Result<(), ProgramError> {
        Ok(())
    }

    /// Start the motion of the current mode. Also called when resuming.
    fn drive(&mut self) -> Result<(), ProgramError> {
        drive_direction(&*self)
    }

    /// Reset any program-specific state.
    fn reset_state(&mut self) -> Result<(), ProgramError> {
        Ok(())
    }

    /// Status message for the current mode.
    fn status(&self) -> String {
        match self.core().mode() {
            Some(m) => m.status().to_string(),
            None => String::from("not started"),
        }
    }

    // ---- THRESHOLDS ----

    fn dist_to_time(&self, dist_cm: f64) -> Result<f64, ProgramError> {
        Ok(dist_cm / (self.core().params.get(DISTANCE_PER_SECOND)? * self.speed()?))
    }

    fn time_to_dist(&self, time_s: f64) -> Result<f64, ProgramError> {
        Ok(time_s * self.core().params.get(DISTANCE_PER_SECOND)? * self.speed()?)
    }

    fn angle_to_time(&self, angle_deg: f64) -> Result<f64, ProgramError> {
        Ok(angle_deg / (self.core().params.get(ANGLE_PER_SECOND)? * self.speed()?))
    }

    fn radians_to_time(&self, angle_rad: f64) -> Result<f64, ProgramError> {
        self.angle_to_time(angle_rad.to_degrees())
    }

    /// True if more than `time_s` seconds have been spent in the current mode.
    fn has_elapsed(&self, time_s: f64) -> bool {
        self.core().has_elapsed(time_s)
    }

    /// True if driving straight in the current mode has covered `dist_cm`.
    fn has_travelled(&self, dist_cm: f64) -> Result<bool, ProgramError> {
        Ok(self.has_elapsed(self.dist_to_time(dist_cm)?))
    }

    /// True if pivoting in the current mode has turned through `angle_deg`.
    fn has_rotated(&self, angle_deg: f64) -> Result<bool, ProgramError> {
        let t = self.angle_to_time(angle_deg)? * self.rotation_factor()?;
        Ok(self.has_elapsed(t))
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State shared by every mode program.
pub struct ModeCore<M> {
    mode: Option<M>,
    timer: ModeTimer,
    env: ProgramEnv,

    pub params: ParamStore,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<M: ModeId> ModeCore<M> {
    /// Create a stopped core which has not entered any mode.
    pub fn new(env: ProgramEnv, params: ParamStore) -> Self {
        Self {
            mode: None,
            timer: ModeTimer::new(env.clock.now()),
            env,
            params,
        }
    }

    /// The current mode, `None` if the program hasn't begun.
    pub fn mode(&self) -> Option<M> {
        self.mode
    }

    pub fn robot(&self) -> &RobotHandle {
        &self.env.robot
    }

    /// True while the program is stopped.
    pub fn is_paused(&self) -> bool {
        self.timer.is_paused()
    }

    /// True once the program has been started since it was created or reset.
    pub fn has_started(&self) -> bool {
        self.timer.has_started()
    }

    /// Time spent in the current mode, not counting pauses.
    pub fn mode_elapsed(&self) -> Duration {
        self.timer.elapsed(self.env.clock.now())
    }

    pub fn mode_secs(&self) -> f64 {
        self.mode_elapsed().as_secs_f64()
    }

    pub fn has_elapsed(&self, time_s: f64) -> bool {
        self.mode_secs() > time_s
    }

    /// Direction of the current mode, `None` if the program hasn't begun.
    pub fn direction(&self) -> Option<Direction> {
        self.mode.map(ModeId::direction)
    }

    /// Average obstacle reading.
    pub fn obstacle(&self) -> Result<f64, ProgramError> {
        Ok(robot::average(&self.env.robot.read_obstacle()?))
    }

    fn enter(&mut self, mode: M) {
        self.mode = Some(mode);
        self.timer.restart(self.env.clock.now());
    }

    fn pause(&mut self) {
        self.timer.pause(self.env.clock.now());
    }

    fn resume(&mut self) {
        self.timer.resume(self.env.clock.now());
    }

    fn clear(&mut self) {
        self.mode = None;
        self.timer = ModeTimer::new(self.env.clock.now());
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Switch to `mode`, returning its status message.
///
/// The robot is stopped, `end_mode` runs against the mode being left, the mode and its timer are
/// switched over, `begin_mode` runs against the new mode, and finally the new motion starts.
pub fn goto_mode<P>(program: &mut P, mode: P::Mode) -> Result<String, ProgramError>
where
    P: ModeProgram + ?Sized,
{
    program.core().robot().stop()?;
    program.end_mode()?;

    debug!("Mode {:?} -> {:?}", program.core().mode(), mode);
    program.core_mut().enter(mode);

    program.begin_mode()?;
    program.drive()?;

    Ok(program.status())
}

/// Run one tick of the program.
pub fn step<P>(program: &mut P) -> Result<Option<String>, ProgramError>
where
    P: ModeProgram + ?Sized,
{
    match program.next_mode()? {
        Next::Stay => Ok(None),
        Next::Goto(mode) => goto_mode(program, mode).map(Some),
        Next::Restart => {
            debug!("Restarting from {:?}", program.core().mode());
            reset(program)?;
            start(program)?;
            Ok(Some(RESTART_STATUS.to_string()))
        }
    }
}

/// Resume timing and the current mode's motion.
pub fn start<P>(program: &mut P) -> Result<(), ProgramError>
where
    P: ModeProgram + ?Sized,
{
    program.core_mut().resume();
    if program.core().mode().is_some() {
        program.drive()?;
    }
    Ok(())
}

/// Stop the robot and freeze timing.
pub fn stop<P>(program: &mut P) -> Result<(), ProgramError>
where
    P: ModeProgram + ?Sized,
{
    program.core_mut().pause();
    program.core().robot().stop()?;
    Ok(())
}

/// Stop the robot and return to the not-started state, keeping parameters.
pub fn reset<P>(program: &mut P) -> Result<(), ProgramError>
where
    P: ModeProgram + ?Sized,
{
    program.core().robot().stop()?;
    program.core_mut().clear();
    program.reset_state()
}

/// Drive according to the current mode's [`Direction`].
pub fn drive_direction<P>(program: &P) -> Result<(), ProgramError>
where
    P: ModeProgram + ?Sized,
{
    let direction = match program.core().direction() {
        Some(d) => d,
        None => return Ok(()),
    };

    let robot = program.core().robot();

    match direction {
        Direction::Forward => robot.forward(program.speed()?)?,
        Direction::Backward => robot.backward(program.speed()?)?,
        Direction::Ccw => robot.rotate(program.rotation_sign() * program.speed()?)?,
        Direction::Cw => robot.rotate(-program.rotation_sign() * program.speed()?)?,
        Direction::Halt => robot.stop()?,
    }

    Ok(())
}
