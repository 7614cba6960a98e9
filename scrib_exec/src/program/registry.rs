//! # Program registry
//!
//! Maps the identifiers used in `program:<id>` commands to program constructors.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{bounce, Avoider, Program, ProgramEnv, ProgramError, Square, Tracie};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifier of a registered program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramId {
    Avoid,
    Square,
    Trace,
    Bounce,
}

/// The identifier isn't registered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown program: {0}")]
pub struct UnknownProgram(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ProgramId {
    /// Every registered program.
    pub const ALL: [ProgramId; 4] = [
        ProgramId::Avoid,
        ProgramId::Square,
        ProgramId::Trace,
        ProgramId::Bounce,
    ];

    /// Program run when nothing else has been chosen.
    pub const DEFAULT: ProgramId = ProgramId::Avoid;

    pub fn as_str(self) -> &'static str {
        match self {
            ProgramId::Avoid => "avoid",
            ProgramId::Square => "square",
            ProgramId::Trace => "trace",
            ProgramId::Bounce => "bounce",
        }
    }

    /// Construct a fresh, stopped instance of the program.
    pub fn build(self, env: ProgramEnv) -> Result<Box<dyn Program>, ProgramError> {
        Ok(match self {
            ProgramId::Avoid => Box::new(Avoider::new(env)?),
            ProgramId::Square => Box::new(Square::new(env)?),
            ProgramId::Trace => Box::new(Tracie::new(env)?),
            ProgramId::Bounce => Box::new(bounce::new(env)?),
        })
    }
}

impl Default for ProgramId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for ProgramId {
    type Err = UnknownProgram;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProgramId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownProgram(s.to_string()))
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::test_env::TestEnv;

    #[test]
    fn test_ids_round_trip() {
        for id in ProgramId::ALL.iter() {
            assert_eq!(id.as_str().parse::<ProgramId>().unwrap(), *id);
        }
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(
            "doesnotexist".parse::<ProgramId>(),
            Err(UnknownProgram("doesnotexist".into()))
        );
        assert_eq!(
            UnknownProgram("doesnotexist".into()).to_string(),
            "unknown program: doesnotexist"
        );
    }

    #[test]
    fn test_every_program_builds() {
        let t = TestEnv::new(0.0);
        for id in ProgramId::ALL.iter() {
            let mut p = id.build(t.env()).unwrap();
            assert!(p.params().name_for("sp").is_ok());
        }
    }

    #[test]
    fn test_deserialise() {
        #[derive(Deserialize)]
        struct Wrapper {
            program: ProgramId,
        }

        let w: Wrapper = util::params::parse("program = \"trace\"").unwrap();
        assert_eq!(w.program, ProgramId::Trace);
    }
}
