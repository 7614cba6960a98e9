//! Logger setup shared by the executables
//!
//! Records go to stdout with coloured level tags, and to the session's log file with plain ones.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Display;

use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

use crate::session;

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Crates which are too chatty below the given level.
const LEVEL_CAPS: &[(&str, LevelFilter)] = &[("zmq", LevelFilter::Info)];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must let `INFO` records through. Only the first call in a process succeeds.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", line(record, colour_tag(record.level()), message)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", line(record, plain_tag(record.level()), message)))
        })
        .chain(log_file);

    LEVEL_CAPS
        .iter()
        .fold(fern::Dispatch::new().level(min_level), |d, (target, cap)| {
            d.level_for(*target, *cap)
        })
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging at {:?} to {:?}", min_level, session.log_file_path);
    if let Ok(epoch) = session::get_epoch() {
        info!("Session epoch {}", epoch);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn line(record: &Record, tag: impl Display, message: &dyn Display) -> String {
    format_line(
        session::get_elapsed_seconds(),
        record.level(),
        record.target(),
        tag,
        message
    )
}

/// Format one log line. Debug and trace records also show their target.
fn format_line(
    secs: f64,
    level: Level,
    target: &str,
    tag: impl Display,
    message: &dyn Display
) -> String {
    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", secs, tag, target, message)
    }
    else {
        format!("[{:10.6} {}] {}", secs, tag, message)
    }
}

fn plain_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR"
    }
}

fn colour_tag(level: Level) -> ColoredString {
    let tag = plain_tag(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info  => tag.normal(),
        Level::Warn  => tag.yellow(),
        Level::Error => tag.red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tags() {
        assert_eq!(plain_tag(Level::Warn), "WRN");
        assert!(colour_tag(Level::Warn).to_string().contains("WRN"));
        assert!(colour_tag(Level::Info).to_string().contains("INF"));
    }

    #[test]
    fn test_target_shown_below_info() {
        assert_eq!(
            format_line(1.5, Level::Debug, "scrib_lib::controller", "DBG", &"hello"),
            "[  1.500000 DBG] scrib_lib::controller: hello"
        );
        assert_eq!(
            format_line(1.5, Level::Info, "scrib_lib::controller", "INF", &"hello"),
            "[  1.500000 INF] hello"
        );
    }
}
