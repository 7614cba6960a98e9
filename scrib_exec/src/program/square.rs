//! # Square
//!
//! Drives the four sides of a square, then one full circle, then starts the square again.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::PI;

use super::{
    mode::{self, Direction, ModeCore, ModeId, ModeProgram, Next},
    ParamDef, ParamStore, Program, ProgramEnv, ProgramError,
};
use crate::robot::RobotHandle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const SIDE_LENGTH: &str = "side_length";
pub const CIRCLE_RADIUS: &str = "circle_radius";

/// Speed of the inner wheel while circling, as a fraction of the outer wheel's speed.
pub const OTHER_WHEEL: &str = "other_wheel";

pub const SQUARE_PARAMS: &[ParamDef] = &[
    ParamDef::new("sl", SIDE_LENGTH, 10.0),
    ParamDef::new("rad", CIRCLE_RADIUS, 10.0),
    ParamDef::new("ow", OTHER_WHEEL, 0.0),
];

const NUM_SIDES: u8 = 4;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareMode {
    /// Driving the given side, 0 to 3
    Side(u8),

    /// Turning the corner after the given side
    Corner(u8),

    Circle,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Square {
    core: ModeCore<SquareMode>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModeId for SquareMode {
    fn direction(self) -> Direction {
        match self {
            SquareMode::Side(_) => Direction::Forward,
            SquareMode::Corner(_) => Direction::Ccw,
            // Driven with the motors directly
            SquareMode::Circle => Direction::Halt,
        }
    }

    fn status(self) -> &'static str {
        match self {
            SquareMode::Side(_) => "driving side",
            SquareMode::Corner(_) => "turning corner",
            SquareMode::Circle => "driving circle",
        }
    }
}

impl Square {
    pub fn new(env: ProgramEnv) -> Result<Self, ProgramError> {
        let mut params = ParamStore::with_base();
        params.add(SQUARE_PARAMS)?;

        Ok(Self {
            core: ModeCore::new(env, params),
        })
    }
}

impl ModeProgram for Square {
    type Mode = SquareMode;

    fn core(&self) -> &ModeCore<SquareMode> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore<SquareMode> {
        &mut self.core
    }

    fn next_mode(&mut self) -> Result<Next<SquareMode>, ProgramError> {
        let params = &self.core.params;

        let next = match self.core.mode() {
            None => Next::Goto(SquareMode::Side(0)),
            Some(SquareMode::Side(n)) => {
                if self.has_travelled(params.get(SIDE_LENGTH)?)? {
                    Next::Goto(SquareMode::Corner(n))
                }
                else {
                    Next::Stay
                }
            }
            Some(SquareMode::Corner(n)) => {
                if !self.has_rotated(90.0)? {
                    Next::Stay
                }
                else if n + 1 < NUM_SIDES {
                    Next::Goto(SquareMode::Side(n + 1))
                }
                else {
                    Next::Goto(SquareMode::Circle)
                }
            }
            Some(SquareMode::Circle) => {
                if self.has_travelled(2.0 * PI * params.get(CIRCLE_RADIUS)?)? {
                    Next::Goto(SquareMode::Side(0))
                }
                else {
                    Next::Stay
                }
            }
        };

        Ok(next)
    }

    fn drive(&mut self) -> Result<(), ProgramError> {
        match self.core.mode() {
            Some(SquareMode::Circle) => {
                let speed = self.speed()?;
                let other = self.core.params.get(OTHER_WHEEL)?;
                self.core.robot().motors(speed, speed * other)?;
                Ok(())
            }
            _ => mode::drive_direction(&*self),
        }
    }
}

impl Program for Square {
    fn start(&mut self) -> Result<(), ProgramError> {
        mode::start(self)
    }

    fn stop(&mut self) -> Result<(), ProgramError> {
        mode::stop(self)
    }

    fn reset(&mut self) -> Result<(), ProgramError> {
        mode::reset(self)
    }

    fn has_started(&self) -> bool {
        self.core.has_started()
    }

    fn step(&mut self) -> Result<Option<String>, ProgramError> {
        mode::step(self)
    }

    fn params(&mut self) -> &mut ParamStore {
        &mut self.core.params
    }

    fn robot(&self) -> &RobotHandle {
        self.core.robot()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{program::test_env::TestEnv, robot::Motion};

    #[test]
    fn test_square_then_circle() {
        let t = TestEnv::new(0.0);
        let mut s = Square::new(t.env()).unwrap();
        Program::start(&mut s).unwrap();

        assert_eq!(Program::step(&mut s).unwrap().as_deref(), Some("driving side"));

        // 10 cm at 20 cm/s * 0.5 takes 1 s, 90 deg at 180 deg/s * 0.5 takes 1 s
        for n in 0..NUM_SIDES {
            assert_eq!(s.core.mode(), Some(SquareMode::Side(n)));
            assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.5));
            t.clock.advance_secs(1.1);
            assert_eq!(Program::step(&mut s).unwrap().as_deref(), Some("turning corner"));
            assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(0.5));
            t.clock.advance_secs(1.1);
            Program::step(&mut s).unwrap();
        }

        assert_eq!(s.core.mode(), Some(SquareMode::Circle));
        assert_eq!(t.robot.motion().unwrap(), Motion::Motors(0.5, 0.0));

        // Circumference ~62.8 cm takes ~6.3 s
        t.clock.advance_secs(6.0);
        assert_eq!(Program::step(&mut s).unwrap(), None);
        t.clock.advance_secs(0.5);
        assert_eq!(Program::step(&mut s).unwrap().as_deref(), Some("driving side"));
        assert_eq!(s.core.mode(), Some(SquareMode::Side(0)));
    }

    #[test]
    fn test_resume_circle_uses_motors() {
        let t = TestEnv::new(0.0);
        let mut s = Square::new(t.env()).unwrap();
        s.core.params.set(OTHER_WHEEL, 0.5).unwrap();
        Program::start(&mut s).unwrap();
        Program::step(&mut s).unwrap();
        mode::goto_mode(&mut s, SquareMode::Circle).unwrap();

        Program::stop(&mut s).unwrap();
        assert_eq!(t.robot.motion().unwrap(), Motion::Stopped);
        Program::start(&mut s).unwrap();
        assert_eq!(t.robot.motion().unwrap(), Motion::Motors(0.5, 0.25));
    }
}
