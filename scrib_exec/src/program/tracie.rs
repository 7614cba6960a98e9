//! # Tracie
//!
//! Traces a polyline with a pen. The robot starts on the first point facing the second, then
//! alternately drives to the next point and turns to face the one after it. After the last point it
//! halts until reset.
//!
//! The points can be replaced with `trace:points=x,y;x,y;...`, coordinates in centimetres.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::PI;

use comms_if::cmd::Cmd;
use log::info;

use super::{
    mode::{self, Direction, ModeCore, ModeId, ModeProgram, Next},
    param_store::SPEED,
    ParamDef, ParamStore, Program, ProgramEnv, ProgramError,
};
use crate::robot::RobotHandle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const ROTATION_SPEED: &str = "rotation_speed";

pub const TRACIE_PARAMS: &[ParamDef] = &[ParamDef::new("rs", ROTATION_SPEED, 0.5)];

/// Prefix of the command which replaces the points.
pub const POINTS_PREFIX: &str = "trace:points=";

pub const DEFAULT_POINTS: &[Point] = &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0), (0.0, 0.0)];

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A point in centimetres.
pub type Point = (f64, f64);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    Drive,
    Rotate,
    Halt,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Tracie {
    core: ModeCore<TraceMode>,

    points: Vec<Point>,

    /// Index of the point currently being driven towards.
    index: usize,

    /// +1 to turn counter-clockwise, -1 for clockwise.
    rot_dir: f64,

    /// Duration of the current mode.
    ///
    /// Units: seconds
    go_for: f64,

    /// Angle of the current segment in standard position.
    ///
    /// Units: radians
    heading: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModeId for TraceMode {
    fn direction(self) -> Direction {
        match self {
            TraceMode::Drive => Direction::Forward,
            TraceMode::Rotate => Direction::Ccw,
            TraceMode::Halt => Direction::Halt,
        }
    }

    fn status(self) -> &'static str {
        match self {
            TraceMode::Drive => "drive",
            TraceMode::Rotate => "rotate",
            TraceMode::Halt => "halt",
        }
    }
}

impl Tracie {
    pub fn new(env: ProgramEnv) -> Result<Self, ProgramError> {
        let mut params = ParamStore::with_base();
        params.add(TRACIE_PARAMS)?;

        let points = DEFAULT_POINTS.to_vec();

        Ok(Self {
            core: ModeCore::new(env, params),
            heading: segment_angle(&points, 1),
            points,
            index: 1,
            rot_dir: 1.0,
            go_for: 0.0,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Replace the points and reset, resuming if the program was running.
    pub fn set_points(&mut self, points: Vec<Point>) -> Result<(), ProgramError> {
        if points.len() < 2 {
            return Err(ProgramError::InvalidArgument(format!(
                "need at least 2 points, got {}",
                points.len()
            )));
        }

        let was_running = !self.core.is_paused();
        if was_running {
            mode::stop(self)?;
        }

        self.points = points;
        mode::reset(self)?;

        if was_running {
            mode::start(self)?;
        }

        info!("Tracing {} points", self.points.len());

        Ok(())
    }
}

impl ModeProgram for Tracie {
    type Mode = TraceMode;

    fn core(&self) -> &ModeCore<TraceMode> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore<TraceMode> {
        &mut self.core
    }

    fn speed(&self) -> Result<f64, ProgramError> {
        match self.core.mode() {
            Some(TraceMode::Rotate) => Ok(self.core.params.get(ROTATION_SPEED)?),
            _ => Ok(self.core.params.get(SPEED)?),
        }
    }

    fn rotation_sign(&self) -> f64 {
        self.rot_dir
    }

    fn next_mode(&mut self) -> Result<Next<TraceMode>, ProgramError> {
        let mode = match self.core.mode() {
            Some(m) => m,
            None => return Ok(Next::Goto(TraceMode::Drive)),
        };

        if mode == TraceMode::Halt || !self.has_elapsed(self.go_for) {
            return Ok(Next::Stay);
        }

        let next = match mode {
            TraceMode::Rotate => Next::Goto(TraceMode::Drive),
            TraceMode::Drive => {
                self.index += 1;
                if self.index < self.points.len() {
                    Next::Goto(TraceMode::Rotate)
                }
                else {
                    Next::Goto(TraceMode::Halt)
                }
            }
            TraceMode::Halt => Next::Stay,
        };

        Ok(next)
    }

    fn begin_mode(&mut self) -> Result<(), ProgramError> {
        match self.core.mode() {
            Some(TraceMode::Drive) => {
                let (x1, y1) = self.points[self.index - 1];
                let (x2, y2) = self.points[self.index];
                self.go_for = self.dist_to_time((x2 - x1).hypot(y2 - y1))?;
            }
            Some(TraceMode::Rotate) => {
                let new_heading = segment_angle(&self.points, self.index);
                let delta = normalise_angle(new_heading - self.heading);

                self.rot_dir = if delta > 0.0 { 1.0 } else { -1.0 };
                self.go_for = self.radians_to_time(delta.abs())?;
                self.heading = new_heading;
            }
            _ => (),
        }

        Ok(())
    }

    fn reset_state(&mut self) -> Result<(), ProgramError> {
        self.index = 1;
        self.rot_dir = 1.0;
        self.go_for = 0.0;
        self.heading = segment_angle(&self.points, 1);
        Ok(())
    }
}

impl Program for Tracie {
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

    fn handle_command(&mut self, cmd: &Cmd) -> Result<Option<String>, ProgramError> {
        match cmd {
            Cmd::Custom(text) if text.starts_with(POINTS_PREFIX) => {
                let points = parse_points(&text[POINTS_PREFIX.len()..])?;
                self.set_points(points)?;
                Ok(Some(format!("tracing {} points", self.points.len())))
            }
            _ => super::handle_common_cmd(self, cmd),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Angle in standard position of the segment ending at `points[index]`.
fn segment_angle(points: &[Point], index: usize) -> f64 {
    match (points.get(index.wrapping_sub(1)), points.get(index)) {
        (Some((x1, y1)), Some((x2, y2))) => (y2 - y1).atan2(x2 - x1),
        _ => 0.0,
    }
}

/// Wrap an angle into [-pi, pi).
fn normalise_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Parse points of the form `x,y;x,y;...`.
pub fn parse_points(text: &str) -> Result<Vec<Point>, ProgramError> {
    let invalid = |p: &str| ProgramError::InvalidArgument(format!("bad point \"{}\"", p));

    text.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut coords = p.split(',').map(|c| c.trim().parse::<f64>());
            match (coords.next(), coords.next(), coords.next()) {
                (Some(Ok(x)), Some(Ok(y)), None) if x.is_finite() && y.is_finite() => Ok((x, y)),
                _ => Err(invalid(p)),
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{program::test_env::TestEnv, robot::Motion};

    #[test]
    fn test_parse_points() {
        assert_eq!(
            parse_points("0,0; 10,0 ;10, 5.5;").unwrap(),
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 5.5)]
        );
        assert!(parse_points("0,0;10").is_err());
        assert!(parse_points("0,0;1,2,3").is_err());
        assert!(parse_points("0,0;a,b").is_err());
    }

    #[test]
    fn test_normalise_angle() {
        assert!((normalise_angle(5.0 * PI / 4.0) + 3.0 * PI / 4.0).abs() < 1e-9);
        assert!((normalise_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-9);
        assert!(normalise_angle(0.0).abs() < 1e-9);
    }

    #[test]
    fn test_traces_default_points() {
        let t = TestEnv::new(0.0);
        let mut tr = Tracie::new(t.env()).unwrap();
        Program::start(&mut tr).unwrap();

        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("drive"));
        assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.5));

        // 14.1 cm at 20 cm/s * 0.5 takes ~1.41 s
        t.clock.advance_secs(1.3);
        assert_eq!(Program::step(&mut tr).unwrap(), None);
        t.clock.advance_secs(0.2);
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("rotate"));

        // Right turn of 90 deg at 180 deg/s * 0.5 takes 1 s
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(-0.5));
        t.clock.advance_secs(1.1);
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("drive"));

        t.clock.advance_secs(1.5);
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("rotate"));

        // Right turn of 135 deg takes 1.5 s
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(-0.5));
        t.clock.advance_secs(1.4);
        assert_eq!(Program::step(&mut tr).unwrap(), None);
        t.clock.advance_secs(0.2);
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("drive"));

        // 20 cm takes 2 s, then halt for good
        t.clock.advance_secs(2.1);
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("halt"));
        assert_eq!(t.robot.motion().unwrap(), Motion::Stopped);
        t.clock.advance_secs(100.0);
        assert_eq!(Program::step(&mut tr).unwrap(), None);
    }

    #[test]
    fn test_points_command() {
        let t = TestEnv::new(0.0);
        let mut tr = Tracie::new(t.env()).unwrap();
        Program::start(&mut tr).unwrap();
        Program::step(&mut tr).unwrap();

        let reply = tr
            .handle_command(&Cmd::parse("trace:points=0,0;0,10"))
            .unwrap();
        assert_eq!(reply.as_deref(), Some("tracing 2 points"));
        assert_eq!(tr.points(), &[(0.0, 0.0), (0.0, 10.0)]);
        assert_eq!(tr.core.mode(), None);
        assert!(!tr.core.is_paused());
        assert!(Program::has_started(&tr));

        // Single segment of 10 cm then halt
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("drive"));
        t.clock.advance_secs(1.1);
        assert_eq!(Program::step(&mut tr).unwrap().as_deref(), Some("halt"));
    }

    #[test]
    fn test_points_command_while_stopped_starts_afresh() {
        let t = TestEnv::new(0.0);
        let mut tr = Tracie::new(t.env()).unwrap();
        Program::start(&mut tr).unwrap();
        Program::step(&mut tr).unwrap();
        Program::stop(&mut tr).unwrap();
        assert!(Program::has_started(&tr));

        tr.handle_command(&Cmd::parse("trace:points=0,0;0,10")).unwrap();
        assert!(tr.core.is_paused());
        assert!(!Program::has_started(&tr));
    }

    #[test]
    fn test_points_command_rejects_single_point() {
        let t = TestEnv::new(0.0);
        let mut tr = Tracie::new(t.env()).unwrap();

        let res = tr.handle_command(&Cmd::parse("trace:points=1,1"));
        assert!(matches!(res, Err(ProgramError::InvalidArgument(_))));
        assert_eq!(tr.points(), DEFAULT_POINTS);
    }

    #[test]
    fn test_common_commands_still_handled() {
        let t = TestEnv::new(0.0);
        let mut tr = Tracie::new(t.env()).unwrap();

        assert_eq!(
            tr.handle_command(&Cmd::parse("set:rs=0.25")).unwrap().as_deref(),
            Some("rotation_speed = 0.25")
        );
        assert_eq!(tr.handle_command(&Cmd::parse("trace:nope")).unwrap(), None);
    }
}
