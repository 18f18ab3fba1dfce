//! Environment variable handling for configuration overrides.
//!
//! `BUNDLEDEPS_*` variables override values read from configuration files.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::arch::Arch;
use crate::config::schema::Config;
use crate::error::{Error, Result};

/// Installation root override.
pub const ENV_ROOT: &str = "BUNDLEDEPS_ROOT";
/// Architecture override.
pub const ENV_ARCH: &str = "BUNDLEDEPS_ARCH";
/// qemu version override.
pub const ENV_QEMU_VERSION: &str = "BUNDLEDEPS_QEMU_VERSION";
/// Comma-separated template list.
pub const ENV_TEMPLATES: &str = "BUNDLEDEPS_TEMPLATES";
/// Baseline directory override.
pub const ENV_BASELINE_DIR: &str = "BUNDLEDEPS_BASELINE_DIR";
/// Trace log location override.
pub const ENV_TRACE_LOG: &str = "BUNDLEDEPS_TRACE_LOG";
/// Tracer settle delay override.
pub const ENV_SETTLE_SECONDS: &str = "BUNDLEDEPS_SETTLE_SECONDS";
/// Symlink hop limit override.
pub const ENV_MAX_SYMLINK_HOPS: &str = "BUNDLEDEPS_MAX_SYMLINK_HOPS";

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use bundledeps::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable holds an unparseable value.
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        if let Ok(root) = env::var(ENV_ROOT) {
            config.root = Some(PathBuf::from(root));
        }

        if let Ok(arch) = env::var(ENV_ARCH) {
            config.arch = Some(Arch::from_str(&arch).map_err(|_| Error::Validation {
                field: ENV_ARCH.into(),
                message: format!("unknown architecture '{arch}'"),
            })?);
        }

        if let Ok(version) = env::var(ENV_QEMU_VERSION) {
            config.qemu_version = Some(version);
        }

        if let Ok(templates) = env::var(ENV_TEMPLATES) {
            config.templates = Some(Self::parse_list(&templates));
        }

        if let Ok(dir) = env::var(ENV_BASELINE_DIR) {
            config.baseline_dir = Some(PathBuf::from(dir));
        }

        if let Ok(log_path) = env::var(ENV_TRACE_LOG) {
            config
                .trace
                .get_or_insert_with(Default::default)
                .log_path = Some(PathBuf::from(log_path));
        }

        if let Ok(seconds) = env::var(ENV_SETTLE_SECONDS) {
            let seconds = seconds.trim().parse().map_err(|_| Error::Validation {
                field: ENV_SETTLE_SECONDS.into(),
                message: "must be a non-negative integer".into(),
            })?;
            config
                .trace
                .get_or_insert_with(Default::default)
                .settle_seconds = Some(seconds);
        }

        if let Ok(hops) = env::var(ENV_MAX_SYMLINK_HOPS) {
            config.max_symlink_hops = Some(hops.trim().parse().map_err(|_| Error::Validation {
                field: ENV_MAX_SYMLINK_HOPS.into(),
                message: "must be a positive integer".into(),
            })?);
        }

        Ok(())
    }

    /// Splits a comma-separated list, dropping empty items.
    fn parse_list(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL: [&str; 8] = [
        ENV_ROOT,
        ENV_ARCH,
        ENV_QEMU_VERSION,
        ENV_TEMPLATES,
        ENV_BASELINE_DIR,
        ENV_TRACE_LOG,
        ENV_SETTLE_SECONDS,
        ENV_MAX_SYMLINK_HOPS,
    ];

    fn clear_env() {
        for var in ALL {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            EnvironmentConfig::parse_list(" alpine, ,default,"),
            vec!["alpine".to_string(), "default".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_no_variables_leaves_config_untouched() {
        clear_env();
        let mut config = Config::default();
        EnvironmentConfig::apply_overrides(&mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_overrides_applied() {
        clear_env();
        env::set_var(ENV_ROOT, "/usr/local");
        env::set_var(ENV_ARCH, "amd64");
        env::set_var(ENV_TEMPLATES, "alpine,fedora");
        env::set_var(ENV_SETTLE_SECONDS, "5");
        env::set_var(ENV_TRACE_LOG, "/tmp/other.log");

        let mut config = Config::default();
        let result = EnvironmentConfig::apply_overrides(&mut config);
        clear_env();
        result.unwrap();

        assert_eq!(config.root, Some(PathBuf::from("/usr/local")));
        assert_eq!(config.arch, Some(Arch::X86_64));
        assert_eq!(
            config.templates,
            Some(vec!["alpine".to_string(), "fedora".to_string()])
        );
        let trace = config.trace.unwrap();
        assert_eq!(trace.settle_seconds, Some(5));
        assert_eq!(trace.log_path, Some(PathBuf::from("/tmp/other.log")));
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        env::set_var(ENV_MAX_SYMLINK_HOPS, "many");
        let result = EnvironmentConfig::apply_overrides(&mut Config::default());
        clear_env();
        assert!(matches!(result, Err(Error::Validation { field, .. }) if field == ENV_MAX_SYMLINK_HOPS));

        env::set_var(ENV_ARCH, "sparc");
        let result = EnvironmentConfig::apply_overrides(&mut Config::default());
        clear_env();
        assert!(result.is_err());
    }
}
