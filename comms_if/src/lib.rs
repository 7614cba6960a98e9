//! # Communications interface crate.
//!
//! Provides the text command protocol shared by the executable and its clients, and the network
//! plumbing used to carry it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Text command grammar
pub mod cmd;

/// Network module
pub mod net;
