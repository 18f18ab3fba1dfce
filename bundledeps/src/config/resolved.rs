//! Configuration with every default applied.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::arch::Arch;
use crate::closure::{SeedSet, DEFAULT_MAX_HOPS};
use crate::config::schema::Config;
use crate::error::{Error, Result};
use crate::observe::{TraceConfig, DEFAULT_TEMPLATES};
use crate::process::ProcessRunner;
use crate::toolchain;

/// Default directory holding template definitions, relative to the
/// working directory.
pub const DEFAULT_TEMPLATE_DIR: &str = "../src/lima/templates";
/// Default directory holding baseline snapshots.
pub const DEFAULT_BASELINE_DIR: &str = "..";

/// Settings ready for use by the collection pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Target architecture.
    pub arch: Arch,
    /// Installation root.
    pub root: PathBuf,
    /// Configured qemu version, if any.
    pub qemu_version: Option<String>,
    /// Templates exercised during runtime discovery.
    pub templates: Vec<String>,
    /// Template definition directory.
    pub template_dir: PathBuf,
    /// VM manager instance directory, if known.
    pub instance_dir: Option<PathBuf>,
    /// Baseline snapshot directory.
    pub baseline_dir: PathBuf,
    /// Static entry points.
    pub seeds: SeedSet,
    /// Tracer settings.
    #[serde(skip)]
    pub trace: TraceConfig,
    /// Alias search directory.
    pub alias_search_dir: PathBuf,
    /// Symlink hop limit.
    pub max_symlink_hops: usize,
    /// Default staging directory.
    pub stage_dir: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Applies defaults to `config`, detecting the host architecture with
    /// `runner` when none is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if architecture detection fails.
    pub fn resolve<R: ProcessRunner + ?Sized>(config: Config, runner: &R) -> Result<Self> {
        let arch = match config.arch {
            Some(arch) => arch,
            None => Arch::detect(runner)?,
        };
        Ok(Self::with_arch(config, arch))
    }

    /// Applies defaults to `config` for a known architecture.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundledeps::config::{Config, ResolvedConfig};
    /// use bundledeps::Arch;
    /// use std::path::Path;
    ///
    /// let resolved = ResolvedConfig::with_arch(Config::default(), Arch::Aarch64);
    /// assert_eq!(resolved.root, Path::new("/opt/homebrew"));
    /// assert_eq!(resolved.alias_search_dir, Path::new("/opt/homebrew/opt"));
    /// assert_eq!(resolved.baseline_path(), Path::new("../deps-verification-arm64.txt"));
    /// ```
    #[must_use]
    pub fn with_arch(config: Config, arch: Arch) -> Self {
        let root = config
            .root
            .unwrap_or_else(|| arch.install_root());

        let mut seeds = SeedSet::default();
        if let Some(overrides) = config.seeds {
            if let Some(executables) = overrides.executables {
                seeds.executables = executables;
            }
            if let Some(support_dirs) = overrides.support_dirs {
                seeds.support_dirs = support_dirs;
            }
            if let Some(resource_dirs) = overrides.resource_dirs {
                seeds.resource_dirs = resource_dirs;
            }
        }

        let mut trace = TraceConfig::default();
        if let Some(overrides) = config.trace {
            if let Some(program) = overrides.program {
                trace.start = program;
            }
            if let Some(stop) = overrides.stop {
                trace.stop = stop;
            }
            if let Some(log_path) = overrides.log_path {
                trace.log_path = log_path;
            }
            if let Some(seconds) = overrides.settle_seconds {
                trace.settle = Duration::from_secs(seconds);
            }
        }

        Self {
            arch,
            alias_search_dir: config.alias_search_dir.unwrap_or_else(|| root.join("opt")),
            root,
            qemu_version: config.qemu_version,
            templates: config.templates.unwrap_or_else(|| {
                DEFAULT_TEMPLATES.iter().map(|t| (*t).to_string()).collect()
            }),
            template_dir: config
                .template_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR)),
            instance_dir: config
                .instance_dir
                .or_else(|| home::home_dir().map(|home| home.join(".lima"))),
            baseline_dir: config
                .baseline_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BASELINE_DIR)),
            seeds,
            trace,
            max_symlink_hops: config.max_symlink_hops.unwrap_or(DEFAULT_MAX_HOPS),
            stage_dir: config.stage_dir,
        }
    }

    /// `<baseline_dir>/<per-arch file name>`.
    #[must_use]
    pub fn baseline_path(&self) -> PathBuf {
        self.baseline_dir.join(self.arch.baseline_file_name())
    }

    /// The configured qemu version, or the installed one.
    ///
    /// # Errors
    ///
    /// Returns an environment error if detection fails.
    pub fn qemu_version<R: ProcessRunner + ?Sized>(&self, runner: &R) -> Result<String> {
        match &self.qemu_version {
            Some(version) => Ok(version.clone()),
            None => toolchain::installed_qemu_version(runner),
        }
    }

    /// The VM manager instance directory.
    ///
    /// # Errors
    ///
    /// Returns an environment error if none is configured and no home
    /// directory is known.
    pub fn instance_dir(&self) -> Result<&Path> {
        self.instance_dir.as_deref().ok_or_else(|| Error::Environment {
            reason: "cannot locate the VM instance directory: no home directory".into(),
        })
    }
}
