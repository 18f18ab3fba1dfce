//! Configuration validation.

use std::path::Path;

use crate::config::schema::{Config, SeedConfig, TraceSettings};
use crate::error::{Error, Result};

/// Longest accepted tracer settle delay.
pub const MAX_SETTLE_SECONDS: u64 = 60;
/// Largest accepted symlink hop limit.
pub const MAX_SYMLINK_HOPS_LIMIT: usize = 1024;

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use bundledeps::config::{Config, ConfigValidator};
///
/// ConfigValidator::validate(&Config::default()).unwrap();
///
/// let bad = Config { max_symlink_hops: Some(0), ..Default::default() };
/// assert!(ConfigValidator::validate(&bad).is_err());
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_absolute("root", config.root.as_deref())?;
        Self::validate_absolute("baseline_dir", config.baseline_dir.as_deref())?;
        Self::validate_absolute("stage_dir", config.stage_dir.as_deref())?;

        if let Some(version) = &config.qemu_version {
            Self::validate_identifier("qemu_version", version)?;
        }

        if let Some(templates) = &config.templates {
            if templates.is_empty() {
                return Err(Error::Validation {
                    field: "templates".into(),
                    message: "at least one template is required".into(),
                });
            }
            for template in templates {
                Self::validate_identifier("templates", template)?;
            }
        }

        if let Some(hops) = config.max_symlink_hops {
            if !(1..=MAX_SYMLINK_HOPS_LIMIT).contains(&hops) {
                return Err(Error::Validation {
                    field: "max_symlink_hops".into(),
                    message: format!("must be between 1 and {MAX_SYMLINK_HOPS_LIMIT}"),
                });
            }
        }

        if let Some(seeds) = &config.seeds {
            Self::validate_seeds(seeds)?;
        }
        if let Some(trace) = &config.trace {
            Self::validate_trace(trace)?;
        }

        Ok(())
    }

    /// Checks that a name is non-empty and made of `[A-Za-z0-9._-]`.
    fn validate_identifier(field: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(Error::Validation {
                field: field.into(),
                message: "cannot be empty or only whitespace".into(),
            });
        }

        if trimmed.len() > 255 {
            return Err(Error::Validation {
                field: field.into(),
                message: "cannot exceed 255 characters".into(),
            });
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(Error::Validation {
                field: field.into(),
                message: format!("'{trimmed}' contains invalid character '{bad}'"),
            });
        }

        Ok(())
    }

    fn validate_absolute(field: &str, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) if !path.is_absolute() => Err(Error::Validation {
                field: field.into(),
                message: format!("'{}' must be an absolute path", path.display()),
            }),
            _ => Ok(()),
        }
    }

    fn validate_seeds(seeds: &SeedConfig) -> Result<()> {
        let lists = [
            ("seeds.executables", &seeds.executables),
            ("seeds.support_dirs", &seeds.support_dirs),
            ("seeds.resource_dirs", &seeds.resource_dirs),
        ];
        for (field, entries) in lists {
            for entry in entries.iter().flatten() {
                if entry.trim().is_empty() {
                    return Err(Error::Validation {
                        field: field.into(),
                        message: "entries cannot be empty".into(),
                    });
                }
                if Path::new(entry).is_absolute() {
                    return Err(Error::Validation {
                        field: field.into(),
                        message: format!("'{entry}' must be relative to the root"),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_trace(trace: &TraceSettings) -> Result<()> {
        for (field, argv) in [("trace.program", &trace.program), ("trace.stop", &trace.stop)] {
            if argv.as_ref().is_some_and(Vec::is_empty) {
                return Err(Error::Validation {
                    field: field.into(),
                    message: "command cannot be empty".into(),
                });
            }
        }

        if let Some(seconds) = trace.settle_seconds {
            if seconds > MAX_SETTLE_SECONDS {
                return Err(Error::Validation {
                    field: "trace.settle_seconds".into(),
                    message: format!("cannot exceed {MAX_SETTLE_SECONDS}"),
                });
            }
        }
        Ok(())
    }
}
