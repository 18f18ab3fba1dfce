//! Error types for the bundledeps library.
//!
//! This module provides the error hierarchy for every closure operation,
//! using `thiserror` for ergonomic error handling, plus the [`Outcome`] type
//! used by best-effort steps to report a recoverable skip without failing
//! the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a bundledeps error.
///
/// # Examples
///
/// ```
/// use bundledeps::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the bundledeps library.
///
/// Every variant is fatal to the operation that returned it. Recoverable
/// conditions are reported through [`Outcome::Skipped`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A path handed to the resolver was not absolute.
    #[error("{} is not an absolute path", path.display())]
    NotAbsolute {
        /// The offending path.
        path: PathBuf,
    },

    /// An absolute symlink target points outside the installation root.
    #[error("{} links to {}, which is not in {}", link.display(), target.display(), root.display())]
    LinkEscapesRoot {
        /// The symlink that was followed.
        link: PathBuf,
        /// The literal target of the symlink.
        target: PathBuf,
        /// The installation root.
        root: PathBuf,
    },

    /// A symlink chain revisited one of its own paths.
    #[error("symlink loop detected: {}", path.display())]
    SymlinkLoop {
        /// The path where the loop was detected.
        path: PathBuf,
    },

    /// An invalid filesystem path was encountered.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
        /// The reason the path is invalid.
        reason: String,
    },

    /// A path does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Permission denied accessing a path.
    #[error("permission denied: {}", path.display())]
    PermissionDenied {
        /// The path that could not be accessed.
        path: PathBuf,
    },

    /// One of the fixed entry points could not be resolved.
    #[error("failed to resolve seed dependency {}: {source}", path.display())]
    SeedResolution {
        /// The entry point that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// An external command exited unsuccessfully.
    #[error("command `{command}` failed{}: {stderr}", status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    CommandFailed {
        /// The rendered command line.
        command: String,
        /// The exit status, if the process exited normally.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The host environment cannot support the requested operation.
    #[error("environment error: {reason}")]
    Environment {
        /// What is missing or broken.
        reason: String,
    },

    /// A virtual-machine template definition does not exist.
    #[error("template {template} does not exist in {}", dir.display())]
    TemplateNotFound {
        /// The template name.
        template: String,
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// The dependency set did not match the baseline snapshot.
    #[error(
        "dependency verification failed against {}: {missing} missing, {unexpected} unexpected",
        baseline.display()
    )]
    VerificationFailed {
        /// Number of missing dependencies.
        missing: usize,
        /// Number of unexpected dependencies.
        unexpected: usize,
        /// The baseline file used for comparison.
        baseline: PathBuf,
    },

    /// A snapshot or registry file line could not be interpreted.
    #[error("malformed snapshot entry at line {line}: {reason}")]
    MalformedSnapshot {
        /// The 1-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A rewrite pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of fatal errors.
///
/// Structural errors indicate a broken or unexpected installation; the
/// environment class covers missing or failing host tooling; configuration
/// errors come from user-supplied settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The installation does not look the way the closure expects.
    Structural,
    /// A required external command or host facility is unavailable.
    Environment,
    /// User configuration is invalid.
    Configuration,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Environment => write!(f, "environment"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

impl Error {
    /// Returns the taxonomy class of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundledeps::{Error, ErrorClass};
    /// use std::path::PathBuf;
    ///
    /// let err = Error::NotAbsolute { path: PathBuf::from("relative/path") };
    /// assert_eq!(err.class(), ErrorClass::Structural);
    /// ```
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotAbsolute { .. }
            | Self::LinkEscapesRoot { .. }
            | Self::SymlinkLoop { .. }
            | Self::InvalidPath { .. }
            | Self::PathNotFound { .. }
            | Self::SeedResolution { .. }
            | Self::VerificationFailed { .. }
            | Self::MalformedSnapshot { .. } => ErrorClass::Structural,
            Self::CommandFailed { .. }
            | Self::Environment { .. }
            | Self::TemplateNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::Io(_) => ErrorClass::Environment,
            Self::Validation { .. }
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Pattern(_) => ErrorClass::Configuration,
        }
    }

    /// Check if error indicates a path does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundledeps::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::PathNotFound { path: PathBuf::from("/nonexistent") };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }

    /// Maps an I/O error on `path` to the most specific variant.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::PathNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io(err),
        }
    }
}

/// Outcome of a best-effort step.
///
/// Fatal failures are reported as `Err(Error)`; a step that could not run
/// but does not invalidate the rest of the closure reports
/// [`Outcome::Skipped`] with a reason that callers turn into a warning.
///
/// # Examples
///
/// ```
/// use bundledeps::Outcome;
///
/// let done: Outcome<usize> = Outcome::Completed(4);
/// assert_eq!(done.completed(), Some(4));
///
/// let skipped: Outcome<usize> = Outcome::skipped("trace log not found");
/// assert!(skipped.is_skipped());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The step ran to completion.
    Completed(T),
    /// The step was skipped; the run continues.
    Skipped {
        /// Why the step was skipped.
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Creates a skipped outcome.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the step was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Returns the completed value, discarding the skip reason.
    #[must_use]
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped { .. } => None,
        }
    }

    /// Borrows the completed value.
    #[must_use]
    pub fn as_completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped { .. } => None,
        }
    }

    /// Maps the completed value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Completed(value) => Outcome::Completed(f(value)),
            Self::Skipped { reason } => Outcome::Skipped { reason },
        }
    }
}
