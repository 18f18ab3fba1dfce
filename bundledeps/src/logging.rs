//! Logging infrastructure for the bundledeps library.
//!
//! This module provides a simple stderr-based logging system with
//! configurable log levels. [`Logger`] implements [`log::Log`], so once
//! [`init_logger`] has installed it, the `log::warn!`/`log::info!` events
//! emitted by the closure components honor the selected level.

use std::env;
use std::fmt;

/// Environment variable consulted when no CLI flag selects a level.
pub const LOG_MODE_ENV: &str = "BUNDLEDEPS_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use bundledeps::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all non-essential output.
    Quiet,
    /// Normal output level (errors and warnings).
    Normal,
    /// Verbose output (errors, warnings, info, and debug messages).
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundledeps::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }

    /// The most verbose `log` level that passes at this setting.
    #[must_use]
    pub const fn filter(self) -> log::LevelFilter {
        match self {
            Self::Quiet => log::LevelFilter::Off,
            Self::Normal => log::LevelFilter::Warn,
            Self::Verbose => log::LevelFilter::Debug,
        }
    }
}

/// A simple stderr-based logger.
///
/// The logger respects the configured log level and only outputs messages
/// at or above that level.
///
/// # Examples
///
/// ```
/// use bundledeps::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.warn("trace log not found, skipping runtime discovery");
/// logger.info("This will not be printed (requires Verbose)");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Logs an error message.
    ///
    /// Error messages are always displayed unless the level is Quiet.
    pub fn error(&self, message: &str) {
        if self.level >= LogLevel::Normal {
            eprintln!("ERROR: {message}");
        }
    }

    /// Logs a warning message.
    pub fn warn(&self, message: &str) {
        if self.level >= LogLevel::Normal {
            eprintln!("WARN: {message}");
        }
    }

    /// Logs an informational message.
    ///
    /// Info messages are only displayed at Verbose level.
    pub fn info(&self, message: &str) {
        if self.level >= LogLevel::Verbose {
            eprintln!("INFO: {message}");
        }
    }

    /// Logs a debug message.
    pub fn debug(&self, message: &str) {
        if self.level >= LogLevel::Verbose {
            eprintln!("DEBUG: {message}");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level.filter()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        match record.level() {
            log::Level::Error => self.error(&message),
            log::Level::Warn => self.warn(&message),
            log::Level::Info => self.info(&message),
            log::Level::Debug | log::Level::Trace => self.debug(&message),
        }
    }

    fn flush(&self) {}
}

/// Selects the log level from CLI flags and the environment.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet)
/// 2. `BUNDLEDEPS_LOG_MODE` environment variable
/// 3. Default (Normal)
///
/// If both `verbose` and `quiet` are true, `verbose` takes precedence.
#[must_use]
pub fn select_level(verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        return LogLevel::Verbose;
    }
    if quiet {
        return LogLevel::Quiet;
    }

    if let Ok(env_value) = env::var(LOG_MODE_ENV) {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return level;
        }
    }

    LogLevel::Normal
}

/// Initializes the process-wide logger from CLI flags and the environment.
///
/// The level is chosen by [`select_level`]. The returned [`Logger`] is a copy
/// of the one installed behind the `log` facade; installing twice keeps the
/// first logger but still updates the maximum level.
///
/// # Examples
///
/// ```
/// use bundledeps::{init_logger, LogLevel};
///
/// let logger = init_logger(true, false);
/// assert_eq!(logger.level(), LogLevel::Verbose);
/// ```
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    let logger = Logger::new(select_level(verbose, quiet));
    // A second install only fails because a logger is already present.
    let _ = log::set_boxed_logger(Box::new(logger));
    log::set_max_level(logger.level().filter());
    logger
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use serial_test::serial;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Quiet < LogLevel::Normal);
        assert!(LogLevel::Normal < LogLevel::Verbose);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Quiet), "quiet");
        assert_eq!(format!("{}", LogLevel::Normal), "normal");
        assert_eq!(format!("{}", LogLevel::Verbose), "verbose");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("Normal").unwrap(), LogLevel::Normal);
        assert_eq!(LogLevel::parse("QUIET").unwrap(), LogLevel::Quiet);
        assert!(LogLevel::parse("").is_err());
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Quiet.filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::Normal.filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Verbose.filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_logger_enabled_respects_level() {
        let normal = Logger::new(LogLevel::Normal);
        let warn = log::Metadata::builder().level(log::Level::Warn).build();
        let info = log::Metadata::builder().level(log::Level::Info).build();
        assert!(normal.enabled(&warn));
        assert!(!normal.enabled(&info));

        let quiet = Logger::new(LogLevel::Quiet);
        let error = log::Metadata::builder().level(log::Level::Error).build();
        assert!(!quiet.enabled(&error));

        let verbose = Logger::new(LogLevel::Verbose);
        assert!(verbose.enabled(&info));
    }

    #[test]
    fn test_logger_default() {
        assert_eq!(Logger::default().level(), LogLevel::Normal);
    }

    #[test]
    #[serial]
    fn test_select_level_defaults() {
        let saved_env = env::var(LOG_MODE_ENV).ok();
        env::remove_var(LOG_MODE_ENV);

        assert_eq!(select_level(false, false), LogLevel::Normal);

        if let Some(val) = saved_env {
            env::set_var(LOG_MODE_ENV, val);
        }
    }

    #[test]
    fn test_select_level_flags() {
        assert_eq!(select_level(true, false), LogLevel::Verbose);
        assert_eq!(select_level(false, true), LogLevel::Quiet);
        assert_eq!(select_level(true, true), LogLevel::Verbose);
    }

    #[test]
    #[serial]
    fn test_select_level_from_env() {
        let saved_env = env::var(LOG_MODE_ENV).ok();

        env::set_var(LOG_MODE_ENV, "verbose");
        assert_eq!(select_level(false, false), LogLevel::Verbose);

        env::set_var(LOG_MODE_ENV, "invalid");
        assert_eq!(select_level(false, false), LogLevel::Normal);

        env::set_var(LOG_MODE_ENV, "normal");
        assert_eq!(select_level(false, true), LogLevel::Quiet);

        match saved_env {
            Some(val) => env::set_var(LOG_MODE_ENV, val),
            None => env::remove_var(LOG_MODE_ENV),
        }
    }
}
