//! # Scribbler Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::{Deserialize, Serialize};

use crate::{controller::ControllerParams, program::ProgramId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScribExecParams {
    /// Program active when the executable starts
    #[serde(default)]
    pub default_program: ProgramId,

    /// Period between steps of the running program
    ///
    /// Units: seconds
    pub loop_period_s: f64,

    /// Longest wait for a `long:status` sent to the command endpoint
    ///
    /// Units: seconds
    pub status_timeout_s: f64,

    /// Reading reported by the null robot's obstacle sensor
    pub obstacle_reading: f64,

    /// Command and status endpoints
    #[serde(flatten)]
    pub net: NetParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScribExecParams {
    pub fn controller_params(&self) -> ControllerParams {
        ControllerParams {
            loop_period: util::time::seconds_to_duration(self.loop_period_s),
            status_timeout: util::time::seconds_to_duration(self.status_timeout_s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_exec_params() {
        let params: ScribExecParams = util::params::parse(
            r#"
            default_program = "bounce"
            loop_period_s = 0.2
            status_timeout_s = 2.0
            obstacle_reading = 0.0
            cmd_endpoint = "tcp://*:5020"
            status_endpoint = "tcp://*:5021"
            "#,
        )
        .unwrap();

        assert_eq!(params.default_program, ProgramId::Bounce);
        assert_eq!(params.net.cmd_endpoint, "tcp://*:5020");
        assert_eq!(params.controller_params().loop_period, Duration::from_millis(200));
        assert_eq!(params.controller_params().status_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_default_program() {
        let params: ScribExecParams = util::params::parse(
            r#"
            loop_period_s = 0.05
            status_timeout_s = 1.0
            obstacle_reading = 0.0
            cmd_endpoint = "tcp://*:5020"
            status_endpoint = "tcp://*:5021"
            "#,
        )
        .unwrap();

        assert_eq!(params.default_program, ProgramId::Avoid);
    }
}
