//! Layered configuration assembly.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::{ConfigLoader, ConfigSource};
use crate::config::merger::ConfigMerger;
use crate::config::schema::Config;
use crate::config::validator::ConfigValidator;
use crate::error::Result;

/// Builds a [`Config`] from files, environment and programmatic overrides.
///
/// # Examples
///
/// ```
/// use bundledeps::config::{Config, ConfigBuilder};
///
/// let config = ConfigBuilder::new()
///     .skip_files()
///     .skip_env()
///     .with_config(Config { qemu_version: Some("9.0.2".into()), ..Default::default() })
///     .build()
///     .unwrap();
/// assert_eq!(config.qemu_version.as_deref(), Some("9.0.2"));
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    working_dir: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    overrides: Vec<Config>,
    skip_files: bool,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Creates a builder reading every source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts project discovery at `dir` instead of the current directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// Reads the user config from `<dir>/config.yaml`.
    #[must_use]
    pub fn with_user_dir(mut self, dir: &Path) -> Self {
        self.user_dir = Some(dir.to_path_buf());
        self
    }

    /// Uses `path` in place of the discovered project config.
    #[must_use]
    pub fn with_config_file(mut self, path: &Path) -> Self {
        self.config_file = Some(path.to_path_buf());
        self
    }

    /// Adds programmatic overrides above every other source.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.overrides.push(config);
        self
    }

    /// Ignores configuration files.
    #[must_use]
    pub fn skip_files(mut self) -> Self {
        self.skip_files = true;
        self
    }

    /// Ignores `BUNDLEDEPS_*` variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Merges all sources and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be loaded, an environment variable
    /// is malformed, or the merged configuration is invalid.
    pub fn build(self) -> Result<Config> {
        let mut config = if self.skip_files {
            Config::default()
        } else {
            ConfigMerger::merge(self.file_sources()?)
        };

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }
        for overrides in &self.overrides {
            ConfigMerger::merge_into(&mut config, overrides);
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    fn file_sources(&self) -> Result<Vec<ConfigSource>> {
        let working_dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        let Some(path) = &self.config_file else {
            return ConfigLoader::load_all(&working_dir, self.user_dir.as_deref());
        };

        let mut sources: Vec<ConfigSource> =
            ConfigLoader::load_all(&working_dir, self.user_dir.as_deref())?
                .into_iter()
                .filter(|source| source.precedence < 2)
                .collect();
        sources.push(ConfigSource {
            path: path.clone(),
            precedence: 2,
            config: ConfigLoader::load_file(path)?,
        });
        Ok(sources)
    }
}
