//! Generic logger utility functions
//!
//! Log records go to stdout with coloured level tags and to the session's log file with plain
//! tags. Every record is stamped with the seconds elapsed since the session epoch, and records
//! above `INFO` also carry the thread they came from, since most of the executables' background
//! work happens off the main thread.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Record};
use std::fmt::Arguments;
use std::thread;
use thiserror::Error;

use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level at least as verbose as `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be at least as verbose as `Info`. Must only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_record(record, message, true)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_record(record, message, false)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("zmq", LevelFilter::Info)
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_record(record: &Record, message: &Arguments, coloured: bool) -> String {
    let level = if coloured {
        level_to_str(record.level()).to_string()
    } else {
        level_to_plain_str(record.level()).to_string()
    };

    if record.level() > log::Level::Info {
        format!(
            "[{:10.6} {}] {} ({}): {}",
            session::get_elapsed_seconds(),
            level,
            record.target(),
            thread::current().name().unwrap_or("unnamed"),
            message
        )
    } else {
        format!(
            "[{:10.6} {}] {}",
            session::get_elapsed_seconds(),
            level,
            message
        )
    }
}

/// Get the coloured representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => level_to_plain_str(level).dimmed().italic(),
        log::Level::Debug => level_to_plain_str(level).dimmed(),
        log::Level::Info => level_to_plain_str(level).normal(),
        log::Level::Warn => level_to_plain_str(level).yellow(),
        log::Level::Error => level_to_plain_str(level).red().bold(),
    }
}

fn level_to_plain_str(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tags() {
        assert_eq!(level_to_plain_str(log::Level::Error), "ERR");
        assert_eq!(level_to_plain_str(log::Level::Trace), "TRC");

        // Colouring keeps the tag text
        colored::control::set_override(false);
        assert_eq!(level_to_str(log::Level::Warn).to_string(), "WRN");
    }
}
