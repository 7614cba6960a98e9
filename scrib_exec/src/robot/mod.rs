//! # Robot capability
//!
//! Programs never touch hardware directly. Everything they can make the robot do, or ask it, goes
//! through the [`Robot`] trait, and a handle to an implementation is given to each program when
//! it is constructed. [`NullRobot`] is a no-op implementation for running without hardware and
//! for tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod null_robot;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

pub use null_robot::{Motion, NullRobot};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Shared handle to the robot, cloned into every program the controller creates.
pub type RobotHandle = Arc<dyn Robot>;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Motion and sensing capability of the robot.
///
/// Speeds are normalised between 0.0 and 1.0. Implementations are shared between the controller
/// and the background thread, so they must handle their own interior mutability.
pub trait Robot: Send + Sync {
    /// Drive straight forwards.
    fn forward(&self, speed: f64) -> Result<(), RobotError>;

    /// Drive straight backwards.
    fn backward(&self, speed: f64) -> Result<(), RobotError>;

    /// Pivot on the spot. Positive speeds rotate counter-clockwise, negative clockwise.
    fn rotate(&self, speed: f64) -> Result<(), RobotError>;

    /// Drive the left and right wheels independently.
    fn motors(&self, left: f64, right: f64) -> Result<(), RobotError>;

    /// Stop all motion.
    fn stop(&self) -> Result<(), RobotError>;

    /// Read the obstacle sensors. Larger values mean a closer obstacle.
    fn read_obstacle(&self) -> Result<Vec<f64>, RobotError>;

    /// Make an audible beep.
    fn beep(&self) -> Result<(), RobotError>;

    /// Diagnostic information about the robot.
    fn info(&self) -> Result<String, RobotError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by a [`Robot`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    #[error("Demanded speed {0} is outside the range -1.0 to 1.0")]
    InvalidSpeed(f64),

    #[error("Robot communication failed: {0}")]
    CommsError(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Average of a set of obstacle readings, zero if there are none.
pub fn average(readings: &[f64]) -> f64 {
    if readings.is_empty() {
        0.0
    }
    else {
        readings.iter().sum::<f64>() / readings.len() as f64
    }
}
