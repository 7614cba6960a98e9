//! # Scribbler library
//!
//! Behaviour supervisor for the Scribbler robot. A [`controller::Controller`] owns one
//! [`program::Program`] at a time, steps it in the background while it runs, and answers the text
//! commands which start, stop, reset, switch, and tune it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Time source injected into programs
pub mod clock;

/// Command and status servers
pub mod cmd_server;

/// Lifecycle and command dispatch for the active program
pub mod controller;

/// Executable parameters
pub mod params;

/// Behaviour programs and the engines they are built on
pub mod program;

/// Robot motion and sensing capability
pub mod robot;
