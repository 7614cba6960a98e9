//! # Command module
//!
//! Every request to the executable is a single line of text of the form `<group>:<action>`, and
//! every request gets exactly one line of text back. This module parses that text into a [`Cmd`]
//! so that neither side has to match on raw strings.
//!
//! | Text | Command |
//! |---|---|
//! | `short:sync` | [`Cmd::Sync`] |
//! | `long:status` | [`Cmd::Status`] |
//! | `program:<id>` | [`Cmd::SwitchProgram`] |
//! | `control:start`, `control:stop`, `control:reset` | [`Cmd::Control`] |
//! | `set:<code>=<value>` | [`Cmd::Set`] |
//! | `other:beep`, `other:info` | [`Cmd::Beep`], [`Cmd::Info`] |
//! | anything else | [`Cmd::Custom`] |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{convert::Infallible, fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix of a program switch command.
pub const PROGRAM_PREFIX: &str = "program:";

/// Prefix of a parameter command.
pub const SET_PREFIX: &str = "set:";

/// Value which requests the current value of a parameter rather than setting it.
pub const QUERY_VALUE: &str = "?";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Snapshot of the controller state.
    Sync,

    /// Wait for the next status message.
    Status,

    /// Replace the active program with a fresh instance of the given program.
    SwitchProgram(String),

    /// Lifecycle action on the active program.
    Control(ControlCmd),

    /// Read or write a program parameter by its short code.
    Set {
        code: String,
        value: SetValue,
    },

    /// Make the robot beep.
    Beep,

    /// Request the robot's diagnostic information.
    Info,

    /// A command with no fixed meaning, left to the active program to interpret.
    Custom(String),
}

/// Lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCmd {
    Start,
    Stop,
    Reset,
}

/// The value part of a [`Cmd::Set`].
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    /// Read the current value
    Query,

    /// Write the given (not yet validated) value
    Assign(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Cmd {
    /// Parse a command from its text form.
    ///
    /// Parsing never fails, text which isn't recognised becomes a [`Cmd::Custom`].
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        match text {
            "short:sync" => return Cmd::Sync,
            "long:status" => return Cmd::Status,
            "control:start" => return Cmd::Control(ControlCmd::Start),
            "control:stop" => return Cmd::Control(ControlCmd::Stop),
            "control:reset" => return Cmd::Control(ControlCmd::Reset),
            "other:beep" => return Cmd::Beep,
            "other:info" => return Cmd::Info,
            _ => (),
        }

        if let Some(id) = text.strip_prefix(PROGRAM_PREFIX) {
            return Cmd::SwitchProgram(id.trim().to_string());
        }

        if let Some(assignment) = text.strip_prefix(SET_PREFIX) {
            let (code, value) = match assignment.split_once('=') {
                Some((c, v)) => (c.trim(), v.trim()),
                None => (assignment.trim(), ""),
            };

            let value = match value {
                "" | QUERY_VALUE => SetValue::Query,
                v => SetValue::Assign(v.to_string()),
            };

            return Cmd::Set {
                code: code.to_string(),
                value,
            };
        }

        Cmd::Custom(text.to_string())
    }
}

impl FromStr for Cmd {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Cmd::parse(s))
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Sync => write!(f, "short:sync"),
            Cmd::Status => write!(f, "long:status"),
            Cmd::SwitchProgram(id) => write!(f, "{}{}", PROGRAM_PREFIX, id),
            Cmd::Control(c) => write!(f, "control:{}", c),
            Cmd::Set { code, value: SetValue::Query } => write!(f, "{}{}=", SET_PREFIX, code),
            Cmd::Set { code, value: SetValue::Assign(v) } => {
                write!(f, "{}{}={}", SET_PREFIX, code, v)
            }
            Cmd::Beep => write!(f, "other:beep"),
            Cmd::Info => write!(f, "other:info"),
            Cmd::Custom(text) => write!(f, "{}", text),
        }
    }
}

impl fmt::Display for ControlCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCmd::Start => write!(f, "start"),
            ControlCmd::Stop => write!(f, "stop"),
            ControlCmd::Reset => write!(f, "reset"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_fixed_commands() {
        assert_eq!(Cmd::parse("short:sync"), Cmd::Sync);
        assert_eq!(Cmd::parse("long:status"), Cmd::Status);
        assert_eq!(Cmd::parse("control:start"), Cmd::Control(ControlCmd::Start));
        assert_eq!(Cmd::parse("control:stop\n"), Cmd::Control(ControlCmd::Stop));
        assert_eq!(Cmd::parse("  control:reset"), Cmd::Control(ControlCmd::Reset));
        assert_eq!(Cmd::parse("other:beep"), Cmd::Beep);
        assert_eq!(Cmd::parse("other:info"), Cmd::Info);
    }

    #[test]
    fn test_parse_program() {
        assert_eq!(Cmd::parse("program:avoid"), Cmd::SwitchProgram("avoid".into()));
        assert_eq!(Cmd::parse("program:"), Cmd::SwitchProgram("".into()));
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            Cmd::parse("set:ot=1.5"),
            Cmd::Set { code: "ot".into(), value: SetValue::Assign("1.5".into()) }
        );
        assert_eq!(
            Cmd::parse("set:ot="),
            Cmd::Set { code: "ot".into(), value: SetValue::Query }
        );
        assert_eq!(
            Cmd::parse("set:ot=?"),
            Cmd::Set { code: "ot".into(), value: SetValue::Query }
        );
        assert_eq!(
            Cmd::parse("set:ot"),
            Cmd::Set { code: "ot".into(), value: SetValue::Query }
        );
        // Garbage values are carried through for the parameter store to reject
        assert_eq!(
            Cmd::parse("set:ot=fast"),
            Cmd::Set { code: "ot".into(), value: SetValue::Assign("fast".into()) }
        );
    }

    #[test]
    fn test_parse_custom() {
        assert_eq!(Cmd::parse("seq:next"), Cmd::Custom("seq:next".into()));
        assert_eq!(Cmd::parse("control:jump"), Cmd::Custom("control:jump".into()));
    }

    #[test]
    fn test_display_matches_wire_text() {
        for text in &[
            "short:sync",
            "long:status",
            "program:trace",
            "control:stop",
            "set:sp=0.4",
            "set:sp=",
            "other:beep",
            "trace:points=0,0;1,1",
        ] {
            assert_eq!(Cmd::parse(text).to_string(), *text);
        }
    }
}
