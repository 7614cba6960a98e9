//! # Bounce
//!
//! Drives forwards until something is close, backs off, turns away, and repeats.

use super::{
    seq::{Condition, Instruction, SeqEntry},
    ProgramEnv, ProgramError, SeqProgram,
};

/// Obstacle reading above which the robot backs off.
pub const BOUNCE_THRESH: f64 = 1000.0;

pub const BOUNCE_TABLE: &[SeqEntry] = &[
    SeqEntry::new(
        Instruction::Forward,
        Condition::ObstacleAbove(BOUNCE_THRESH),
        "driving forward",
    ),
    SeqEntry::new(Instruction::Backward, Condition::Travelled(10.0), "detected obstacle"),
    SeqEntry::new(Instruction::RotateCw, Condition::Rotated(90.0), "turning away"),
];

pub fn new(env: ProgramEnv) -> Result<SeqProgram, ProgramError> {
    SeqProgram::new(env, BOUNCE_TABLE)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        program::{test_env::TestEnv, Program},
        robot::Motion,
    };

    #[test]
    fn test_bounce_cycle() {
        let t = TestEnv::new(0.0);
        let mut p = new(t.env()).unwrap();
        p.start().unwrap();
        assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.5));

        // Only advances once the condition is met
        t.clock.advance_secs(10.0);
        assert_eq!(p.step().unwrap(), None);
        assert_eq!(p.index(), 0);

        t.robot.set_obstacle(1500.0).unwrap();
        assert_eq!(p.step().unwrap().as_deref(), Some("detected obstacle"));
        assert_eq!(t.robot.motion().unwrap(), Motion::Backward(0.5));
        t.robot.set_obstacle(0.0).unwrap();

        // 10 cm at 20 cm/s * 0.5 takes 1 s
        t.clock.advance_secs(0.9);
        assert_eq!(p.step().unwrap(), None);
        t.clock.advance_secs(0.2);
        assert_eq!(p.step().unwrap().as_deref(), Some("turning away"));
        assert_eq!(t.robot.motion().unwrap(), Motion::Rotate(-0.5));

        // 90 deg at 180 deg/s * 0.5 takes 1 s, then wraps to the first entry
        t.clock.advance_secs(1.1);
        assert_eq!(p.step().unwrap().as_deref(), Some("driving forward"));
        assert_eq!(p.index(), 0);
        assert_eq!(t.robot.motion().unwrap(), Motion::Forward(0.5));
    }
}
