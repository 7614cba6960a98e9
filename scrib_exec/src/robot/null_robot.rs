//! # No-op robot
//!
//! A [`Robot`] which moves nothing. It remembers the last motion demanded of it and reports a
//! settable obstacle reading, so it doubles as the hardware stand-in for tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

use log::trace;

use super::{Robot, RobotError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Obstacle reading reported unless another is set.
pub const DEFAULT_OBSTACLE_READING: f64 = 4000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct NullRobot {
    state: Mutex<NullRobotState>,
}

#[derive(Debug)]
struct NullRobotState {
    motion: Motion,
    obstacle: f64,
    num_beeps: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The last motion demanded of a [`NullRobot`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Stopped,
    Forward(f64),
    Backward(f64),
    Rotate(f64),
    Motors(f64, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NullRobot {
    pub fn new(obstacle: f64) -> Self {
        Self {
            state: Mutex::new(NullRobotState {
                motion: Motion::Stopped,
                obstacle,
                num_beeps: 0,
            }),
        }
    }

    /// Change the reading returned by [`Robot::read_obstacle`].
    pub fn set_obstacle(&self, reading: f64) -> Result<(), RobotError> {
        self.state()?.obstacle = reading;
        Ok(())
    }

    /// The most recent motion demand.
    pub fn motion(&self) -> Result<Motion, RobotError> {
        Ok(self.state()?.motion)
    }

    /// Number of beeps made so far.
    pub fn num_beeps(&self) -> Result<usize, RobotError> {
        Ok(self.state()?.num_beeps)
    }

    fn state(&self) -> Result<MutexGuard<NullRobotState>, RobotError> {
        self.state
            .lock()
            .map_err(|_| RobotError::CommsError("NullRobot state lock poisoned".into()))
    }

    fn demand(&self, motion: Motion) -> Result<(), RobotError> {
        let speeds = match motion {
            Motion::Stopped => vec![],
            Motion::Forward(s) | Motion::Backward(s) | Motion::Rotate(s) => vec![s],
            Motion::Motors(l, r) => vec![l, r],
        };

        if let Some(s) = speeds.into_iter().find(|s| !(-1.0..=1.0).contains(s)) {
            return Err(RobotError::InvalidSpeed(s));
        }

        trace!("NullRobot motion: {:?}", motion);
        self.state()?.motion = motion;
        Ok(())
    }
}

impl Default for NullRobot {
    fn default() -> Self {
        Self::new(DEFAULT_OBSTACLE_READING)
    }
}

impl Robot for NullRobot {
    fn forward(&self, speed: f64) -> Result<(), RobotError> {
        self.demand(Motion::Forward(speed))
    }

    fn backward(&self, speed: f64) -> Result<(), RobotError> {
        self.demand(Motion::Backward(speed))
    }

    fn rotate(&self, speed: f64) -> Result<(), RobotError> {
        self.demand(Motion::Rotate(speed))
    }

    fn motors(&self, left: f64, right: f64) -> Result<(), RobotError> {
        self.demand(Motion::Motors(left, right))
    }

    fn stop(&self) -> Result<(), RobotError> {
        self.demand(Motion::Stopped)
    }

    fn read_obstacle(&self) -> Result<Vec<f64>, RobotError> {
        Ok(vec![self.state()?.obstacle])
    }

    fn beep(&self) -> Result<(), RobotError> {
        self.state()?.num_beeps += 1;
        Ok(())
    }

    fn info(&self) -> Result<String, RobotError> {
        Ok(String::from("null robot (no hardware attached)"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_records_motion() {
        let robot = NullRobot::default();
        assert_eq!(robot.motion().unwrap(), Motion::Stopped);

        robot.forward(0.5).unwrap();
        assert_eq!(robot.motion().unwrap(), Motion::Forward(0.5));

        robot.rotate(-0.2).unwrap();
        assert_eq!(robot.motion().unwrap(), Motion::Rotate(-0.2));

        robot.stop().unwrap();
        assert_eq!(robot.motion().unwrap(), Motion::Stopped);
    }

    #[test]
    fn test_rejects_out_of_range_speed() {
        let robot = NullRobot::default();
        robot.forward(0.3).unwrap();

        assert!(matches!(robot.forward(1.5), Err(RobotError::InvalidSpeed(_))));
        assert!(matches!(robot.motors(0.5, -2.0), Err(RobotError::InvalidSpeed(_))));

        // Rejected demands leave the previous motion in place
        assert_eq!(robot.motion().unwrap(), Motion::Forward(0.3));
    }

    #[test]
    fn test_obstacle_reading() {
        let robot = NullRobot::default();
        assert_eq!(robot.read_obstacle().unwrap(), vec![DEFAULT_OBSTACLE_READING]);

        robot.set_obstacle(12.0).unwrap();
        assert_eq!(robot.read_obstacle().unwrap(), vec![12.0]);
    }

    #[test]
    fn test_beep() {
        let robot = NullRobot::default();
        robot.beep().unwrap();
        robot.beep().unwrap();
        assert_eq!(robot.num_beeps().unwrap(), 2);
    }
}
