//! # Avoider
//!
//! Drives forwards until it meets an obstacle, then drives around it and carries on along the
//! original line.
//!
//! On meeting the obstacle the robot first swings a little one way and back again, comparing the
//! sensor readings to decide which way round the obstacle is shorter (`around_mult`). It then turns
//! side on, and alternately drives alongside the obstacle and turns back towards it to check if it
//! has been passed. Once clear it overshoots the front edge, turns, overshoots the side edge, and
//! finally drives back in towards the original line before straightening up and starting over.
//!
//! Lateral displacement from the original line (`x_pos`) is accumulated from each straight leg
//! driven while the heading is `Out` or `In`, and is what the return leg is sized from.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};

use super::{
    mode::{self, Direction, ModeCore, ModeId, ModeProgram, Next},
    param_store::SPEED,
    ParamDef, ParamStore, Program, ProgramEnv, ProgramError,
};
use crate::robot::RobotHandle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const OBSTACLE_SLOWDOWN: &str = "obstacle_slowdown";
pub const OBSTACLE_THRESH: &str = "obstacle_thresh";
pub const COMPARE_ROTATION: &str = "compare_rotation";
pub const NOT_NINETY: &str = "not_ninety";
pub const CHECK_DIST: &str = "check_dist";
pub const OVERSHOOT_FRONT: &str = "overshoot_front";
pub const OVERSHOOT_SIDE: &str = "overshoot_side";
pub const BIAS: &str = "bias";
pub const RETURN_FACTOR: &str = "return_factor";

/// Rotation of every turn onto or off the obstacle's side.
///
/// Units: degrees
const RIGHT_ANGLE: f64 = 90.0;

pub const AVOIDER_PARAMS: &[ParamDef] = &[
    ParamDef::new("sd", OBSTACLE_SLOWDOWN, 0.2),
    // Sensor reading, 0 to 6400
    ParamDef::new("ot", OBSTACLE_THRESH, 1.0),
    ParamDef::new("cr", COMPARE_ROTATION, 25.0),
    // Tunable only, right angle turns are always 90 degrees
    ParamDef::new("nn", NOT_NINETY, 80.0),
    ParamDef::new("cd", CHECK_DIST, 8.0),
    ParamDef::new("of", OVERSHOOT_FRONT, 10.0),
    ParamDef::new("os", OVERSHOOT_SIDE, 14.0),
    // -1 to 1
    ParamDef::new("bi", BIAS, 0.0),
    ParamDef::new("rf", RETURN_FACTOR, 0.75),
];

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Modes of the avoider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidMode {
    Fwd1,
    CcwC,
    CwC,
    Ccw1,
    Fwd2,
    Cw1,
    Ccw2,
    Fwd3,
    Cw2,
    Fwd4,
    Fwd5,
    Ccw3,
}

/// Which leg of the detour the robot is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    /// Parallel to the original line
    Up,
    /// Moving away from the original line
    Out,
    /// Moving back towards the original line
    In,
}

/// Which edge of the obstacle is being passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Side,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Avoider {
    core: ModeCore<AvoidMode>,

    /// Lateral displacement from the original line.
    ///
    /// Units: centimetres
    x_pos: f64,

    heading: Heading,

    /// Rotation sign used to go around the obstacle, +1 or -1.
    around_mult: f64,

    /// Rotation sign decided by the slant check, committed at the end of the check.
    around_mult_f: f64,

    first_obstacle_reading: f64,

    side: Side,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModeId for AvoidMode {
    fn direction(self) -> Direction {
        use AvoidMode::*;

        match self {
            Fwd1 | Fwd2 | Fwd3 | Fwd4 | Fwd5 => Direction::Forward,
            CcwC | Ccw1 | Ccw2 | Ccw3 => Direction::Ccw,
            CwC | Cw1 | Cw2 => Direction::Cw,
        }
    }

    fn status(self) -> &'static str {
        match self {
            AvoidMode::Fwd1 => "driving forward",
            AvoidMode::CcwC => "checking slant",
            AvoidMode::CwC => "unchecking slant",
            AvoidMode::Ccw1 => "turning 90 ccw",
            AvoidMode::Fwd2 => "driving along",
            AvoidMode::Cw1 => "checking obstacle",
            AvoidMode::Ccw2 => "unturning",
            AvoidMode::Fwd3 => "going further",
            AvoidMode::Cw2 => "returning",
            AvoidMode::Fwd4 => "past front edge",
            AvoidMode::Fwd5 => "past back edge",
            AvoidMode::Ccw3 => "straightening up",
        }
    }
}

impl Avoider {
    pub fn new(env: ProgramEnv) -> Result<Self, ProgramError> {
        let mut params = ParamStore::with_base();
        params.add(AVOIDER_PARAMS)?;

        Ok(Self {
            core: ModeCore::new(env, params),
            x_pos: 0.0,
            heading: Heading::Up,
            around_mult: 1.0,
            around_mult_f: 1.0,
            first_obstacle_reading: 0.0,
            side: Side::Front,
        })
    }

    fn param(&self, name: &str) -> Result<f64, ProgramError> {
        Ok(self.core.params.get(name)?)
    }

    fn sees_obstacle(&self) -> Result<bool, ProgramError> {
        Ok(self.core.obstacle()? > self.param(OBSTACLE_THRESH)?)
    }

    fn at_right_angle(&self) -> Result<bool, ProgramError> {
        self.has_rotated(RIGHT_ANGLE)
    }
}

impl ModeProgram for Avoider {
    type Mode = AvoidMode;

    fn core(&self) -> &ModeCore<AvoidMode> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore<AvoidMode> {
        &mut self.core
    }

    fn speed(&self) -> Result<f64, ProgramError> {
        use AvoidMode::*;

        match self.core.mode() {
            Some(Fwd1) | Some(CcwC) | Some(CwC) | Some(Fwd4) | Some(Fwd5) => {
                self.param(OBSTACLE_SLOWDOWN)
            }
            _ => self.param(SPEED),
        }
    }

    fn rotation_sign(&self) -> f64 {
        self.around_mult
    }

    fn rotation_factor(&self) -> Result<f64, ProgramError> {
        let bias = self.param(BIAS)?;

        Ok(match self.core.direction() {
            Some(Direction::Ccw) => 1.0 + self.around_mult * bias,
            Some(Direction::Cw) => 1.0 - self.around_mult * bias,
            _ => 1.0,
        })
    }

    fn next_mode(&mut self) -> Result<Next<AvoidMode>, ProgramError> {
        use AvoidMode::*;

        let mode = match self.core.mode() {
            Some(m) => m,
            None => return Ok(Next::Goto(Fwd1)),
        };

        let next = match mode {
            Fwd1 => {
                let reading = self.core.obstacle()?;
                trace!("Obstacle reading {}", reading);

                if reading > self.param(OBSTACLE_THRESH)? {
                    self.first_obstacle_reading = reading;
                    Next::Goto(CcwC)
                }
                else {
                    Next::Stay
                }
            }
            CcwC => {
                if self.has_rotated(self.param(COMPARE_ROTATION)?)? {
                    self.core.robot().stop()?;

                    // Turning towards the shorter way round lowers the reading
                    self.around_mult_f = if self.core.obstacle()? < self.first_obstacle_reading {
                        1.0
                    }
                    else {
                        -1.0
                    };
                    debug!("Slant check chose rotation sign {}", self.around_mult_f);

                    Next::Goto(CwC)
                }
                else {
                    Next::Stay
                }
            }
            CwC => {
                if self.has_rotated(self.param(COMPARE_ROTATION)?)? {
                    self.around_mult = self.around_mult_f;
                    Next::Goto(Ccw1)
                }
                else {
                    Next::Stay
                }
            }
            Ccw1 => {
                if self.at_right_angle()? {
                    Next::Goto(Fwd2)
                }
                else {
                    Next::Stay
                }
            }
            Fwd2 => {
                if self.has_travelled(self.param(CHECK_DIST)?)? {
                    Next::Goto(Cw1)
                }
                else {
                    Next::Stay
                }
            }
            Cw1 => {
                if self.at_right_angle()? {
                    self.core.robot().stop()?;

                    if self.sees_obstacle()? {
                        Next::Goto(Ccw1)
                    }
                    else {
                        Next::Goto(Ccw2)
                    }
                }
                else {
                    Next::Stay
                }
            }
            Ccw2 => {
                if self.at_right_angle()? {
                    Next::Goto(Fwd3)
                }
                else {
                    Next::Stay
                }
            }
            Fwd3 => {
                if self.has_travelled(self.param(OVERSHOOT_FRONT)?)? {
                    Next::Goto(Cw2)
                }
                else {
                    Next::Stay
                }
            }
            Cw2 => {
                if self.at_right_angle()? {
                    match self.side {
                        Side::Front => Next::Goto(Fwd4),
                        Side::Side => Next::Goto(Fwd5),
                    }
                }
                else {
                    Next::Stay
                }
            }
            Fwd4 => {
                if self.has_travelled(self.param(OVERSHOOT_SIDE)?)? {
                    self.side = Side::Side;
                    Next::Goto(Cw1)
                }
                else if self.sees_obstacle()? {
                    Next::Goto(Ccw1)
                }
                else {
                    Next::Stay
                }
            }
            Fwd5 => {
                if self.has_travelled(self.x_pos * self.param(RETURN_FACTOR)?)? {
                    Next::Goto(Ccw3)
                }
                else if self.sees_obstacle()? {
                    Next::Goto(Ccw1)
                }
                else {
                    Next::Stay
                }
            }
            Ccw3 => {
                if self.at_right_angle()? {
                    Next::Restart
                }
                else {
                    Next::Stay
                }
            }
        };

        Ok(next)
    }

    fn end_mode(&mut self) -> Result<(), ProgramError> {
        use AvoidMode::*;

        let mode = match self.core.mode() {
            None | Some(Fwd1) | Some(CcwC) | Some(CwC) => return Ok(()),
            Some(m) => m,
        };

        let dist = self.time_to_dist(self.core.mode_secs())?;

        match (mode.direction(), self.heading) {
            (Direction::Forward, Heading::Out) | (Direction::Backward, Heading::In) => {
                self.x_pos += dist
            }
            (Direction::Forward, Heading::In) | (Direction::Backward, Heading::Out) => {
                self.x_pos -= dist
            }
            (Direction::Ccw, Heading::Up) => self.heading = Heading::Out,
            (Direction::Ccw, Heading::In) => self.heading = Heading::Up,
            (Direction::Cw, Heading::Up) => self.heading = Heading::In,
            (Direction::Cw, Heading::Out) => self.heading = Heading::Up,
            _ => (),
        }

        trace!("x_pos = {:.2}, heading = {:?}", self.x_pos, self.heading);

        Ok(())
    }

    fn reset_state(&mut self) -> Result<(), ProgramError> {
        self.x_pos = 0.0;
        self.heading = Heading::Up;
        self.around_mult = 1.0;
        self.around_mult_f = 1.0;
        self.first_obstacle_reading = 0.0;
        self.side = Side::Front;
        Ok(())
    }
}

impl Program for Avoider {
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

    fn started(t: &TestEnv) -> Avoider {
        let mut a = Avoider::new(t.env()).unwrap();
        Program::start(&mut a).unwrap();
        a
    }

    /// Advance the clock then step, returning the status.
    fn step_after(t: &TestEnv, a: &mut Avoider, secs: f64) -> Option<String> {
        t.clock.advance_secs(secs);
        Program::step(a).unwrap()
    }

    #[test]
    fn test_first_step_drives_forward_slowly() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);

        assert_eq!(a.core.mode(), None);
        assert_eq!(Program::step(&mut a).unwrap().as_deref(), Some("driving forward"));
        assert_eq!(a.core.mode(), Some(AvoidMode::Fwd1));
        assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.2));

        // Nothing in the way, keep going
        assert_eq!(step_after(&t, &mut a, 30.0), None);
    }

    #[test]
    fn test_obstacle_starts_slant_check() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        Program::step(&mut a).unwrap();

        t.robot.set_obstacle(600.0).unwrap();
        assert_eq!(step_after(&t, &mut a, 0.1).as_deref(), Some("checking slant"));
        assert_eq!(a.core.mode(), Some(AvoidMode::CcwC));
        assert_eq!(a.first_obstacle_reading, 600.0);
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(0.2));
    }

    #[test]
    fn test_slant_check_picks_direction() {
        // Reading rises while turning ccw, so go round clockwise
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(600.0).unwrap();
        Program::step(&mut a).unwrap();

        // 25 deg at 180 deg/s * 0.2 takes ~0.69 s
        t.robot.set_obstacle(900.0).unwrap();
        assert_eq!(step_after(&t, &mut a, 0.5), None);
        assert_eq!(step_after(&t, &mut a, 0.3).as_deref(), Some("unchecking slant"));
        assert_eq!(a.around_mult_f, -1.0);
        // Not committed until the check is undone
        assert_eq!(a.around_mult, 1.0);
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(-0.2));

        assert_eq!(step_after(&t, &mut a, 0.8).as_deref(), Some("turning 90 ccw"));
        assert_eq!(a.around_mult, -1.0);
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(-0.5));
    }

    #[test]
    fn test_still_seeing_obstacle_turns_back_out() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(600.0).unwrap();
        Program::step(&mut a).unwrap();
        step_after(&t, &mut a, 0.8);
        step_after(&t, &mut a, 0.8);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("driving along"));
        assert_eq!(step_after(&t, &mut a, 0.9).as_deref(), Some("checking obstacle"));

        // Obstacle still there after turning back in
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("turning 90 ccw"));

        t.robot.set_obstacle(0.0).unwrap();
        step_after(&t, &mut a, 1.1);
        step_after(&t, &mut a, 0.9);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("unturning"));
    }

    #[test]
    fn test_obstacle_past_front_edge_restarts_detour() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(600.0).unwrap();
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(400.0).unwrap();
        step_after(&t, &mut a, 0.8);
        step_after(&t, &mut a, 0.8);
        step_after(&t, &mut a, 1.1);
        step_after(&t, &mut a, 0.9);
        t.robot.set_obstacle(0.0).unwrap();
        step_after(&t, &mut a, 1.1);
        step_after(&t, &mut a, 1.1);
        step_after(&t, &mut a, 1.1);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("past front edge"));

        t.robot.set_obstacle(50.0).unwrap();
        assert_eq!(step_after(&t, &mut a, 0.5).as_deref(), Some("turning 90 ccw"));
        assert_eq!(a.side, Side::Front);
    }

    #[test]
    fn test_right_angle_is_ninety_degrees() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        a.core.params.set(NOT_NINETY, 45.0).unwrap();
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(600.0).unwrap();
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(400.0).unwrap();
        step_after(&t, &mut a, 0.8);
        assert_eq!(step_after(&t, &mut a, 0.8).as_deref(), Some("turning 90 ccw"));

        // 85.5 deg at 180 deg/s * 0.5
        assert_eq!(step_after(&t, &mut a, 0.95), None);
        assert_eq!(step_after(&t, &mut a, 0.1).as_deref(), Some("driving along"));
    }

    #[test]
    fn test_bias_scales_rotation_time() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        a.core.params.set(BIAS, 0.5).unwrap();
        Program::step(&mut a).unwrap();
        t.robot.set_obstacle(600.0).unwrap();
        Program::step(&mut a).unwrap();

        // ccw with around_mult = 1 takes 1.5x as long, ~1.04 s
        assert_eq!(step_after(&t, &mut a, 0.9), None);
        assert_eq!(step_after(&t, &mut a, 0.2).as_deref(), Some("unchecking slant"));
    }

    #[test]
    fn test_full_detour() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);

        assert_eq!(Program::step(&mut a).unwrap().as_deref(), Some("driving forward"));

        t.robot.set_obstacle(500.0).unwrap();
        assert_eq!(step_after(&t, &mut a, 0.1).as_deref(), Some("checking slant"));

        // Reading drops while turning ccw, so go round counter-clockwise
        t.robot.set_obstacle(400.0).unwrap();
        assert_eq!(step_after(&t, &mut a, 0.8).as_deref(), Some("unchecking slant"));
        assert_eq!(step_after(&t, &mut a, 0.8).as_deref(), Some("turning 90 ccw"));
        assert_eq!(a.around_mult, 1.0);
        assert_eq!(a.heading, Heading::Up);

        // 90 deg at 180 deg/s * 0.5 takes 1 s
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("driving along"));
        assert_eq!(a.heading, Heading::Out);

        // 8 cm at 20 cm/s * 0.5 takes 0.8 s, 0.9 s covers 9 cm
        assert_eq!(step_after(&t, &mut a, 0.9).as_deref(), Some("checking obstacle"));
        assert!((a.x_pos - 9.0).abs() < 1e-6);

        t.robot.set_obstacle(0.0).unwrap();
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("unturning"));
        assert_eq!(a.heading, Heading::Up);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("going further"));
        assert_eq!(a.heading, Heading::Out);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("returning"));
        assert!((a.x_pos - 20.0).abs() < 1e-6);

        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("past front edge"));
        assert_eq!(a.heading, Heading::Up);
        assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.2));

        // 14 cm at 20 cm/s * 0.2 takes 3.5 s
        assert_eq!(step_after(&t, &mut a, 3.0), None);
        assert_eq!(step_after(&t, &mut a, 0.6).as_deref(), Some("checking obstacle"));
        assert_eq!(a.side, Side::Side);
        assert!((a.x_pos - 20.0).abs() < 1e-6);

        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("unturning"));
        assert_eq!(a.heading, Heading::In);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("going further"));
        assert_eq!(a.heading, Heading::Up);
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("returning"));
        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("past back edge"));
        assert_eq!(a.heading, Heading::In);

        // Return 20 * 0.75 = 15 cm at 20 cm/s * 0.2 takes 3.75 s
        assert_eq!(step_after(&t, &mut a, 3.7), None);
        assert_eq!(step_after(&t, &mut a, 0.1).as_deref(), Some("straightening up"));
        assert!((a.x_pos - 4.8).abs() < 1e-6);

        assert_eq!(step_after(&t, &mut a, 1.1).as_deref(), Some("restarting program"));
        assert_eq!(a.core.mode(), None);
        assert_eq!(a.x_pos, 0.0);
        assert_eq!(a.side, Side::Front);

        assert_eq!(step_after(&t, &mut a, 0.1).as_deref(), Some("driving forward"));
    }

    #[test]
    fn test_reset_keeps_params() {
        let t = TestEnv::new(0.0);
        let mut a = started(&t);
        a.core.params.set(OBSTACLE_THRESH, 200.0).unwrap();
        Program::step(&mut a).unwrap();

        Program::stop(&mut a).unwrap();
        Program::reset(&mut a).unwrap();

        assert_eq!(a.core.mode(), None);
        assert_eq!(a.core.params.get(OBSTACLE_THRESH).unwrap(), 200.0);
        assert_eq!(t.robot.motion().unwrap(), Motion::Stopped);
    }
}
