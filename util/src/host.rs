//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the root of the software tree, which holds the `params` and
/// `sessions` directories.
pub const ROOT_ENV_VAR: &str = "SCRIBBLER_ROOT";

/// Get the software root directory from the environment.
pub fn get_scribbler_root() -> Result<PathBuf, env::VarError> {
    env::var(ROOT_ENV_VAR).map(PathBuf::from)
}
