//! Configuration schema definitions.
//!
//! Every field is optional so that partial files can be layered; defaults
//! are applied when a [`Config`] is turned into a
//! [`ResolvedConfig`](super::ResolvedConfig).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::arch::Arch;

/// Complete configuration structure.
///
/// # Examples
///
/// ```
/// use bundledeps::config::Config;
/// use bundledeps::Arch;
///
/// let config: Config = serde_yaml::from_str("arch: arm64\ntemplates: [alpine]\n").unwrap();
/// assert_eq!(config.arch, Some(Arch::Aarch64));
/// assert_eq!(config.templates, Some(vec!["alpine".to_string()]));
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Installation root (defaults per architecture).
    pub root: Option<PathBuf>,

    /// Target architecture (defaults to the host).
    pub arch: Option<Arch>,

    /// Installed qemu version (defaults to the package manager's answer).
    pub qemu_version: Option<String>,

    /// VM templates exercised during runtime discovery.
    pub templates: Option<Vec<String>>,

    /// Directory holding `<template>.yaml` definitions.
    pub template_dir: Option<PathBuf>,

    /// Directory holding per-instance state of the VM manager.
    pub instance_dir: Option<PathBuf>,

    /// Directory holding the per-architecture baseline snapshots.
    pub baseline_dir: Option<PathBuf>,

    /// Static entry points.
    pub seeds: Option<SeedConfig>,

    /// Background tracer settings.
    pub trace: Option<TraceSettings>,

    /// Directory searched for aliases of traced files.
    pub alias_search_dir: Option<PathBuf>,

    /// Maximum symlink hops in one chain.
    pub max_symlink_hops: Option<usize>,

    /// Default destination for `stage`.
    pub stage_dir: Option<PathBuf>,
}

/// Static entry point overrides, relative to the root.
///
/// Each list replaces the corresponding default list when present.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Executables, walked and traced.
    pub executables: Option<Vec<String>>,
    /// Supporting directories, walked.
    pub support_dirs: Option<Vec<String>>,
    /// Resource directories, recorded directly.
    pub resource_dirs: Option<Vec<String>>,
}

/// Background tracer overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TraceSettings {
    /// Start command prefix; traced executables are appended.
    pub program: Option<Vec<String>>,
    /// Command stopping the tracer.
    pub stop: Option<Vec<String>>,
    /// Where the tracer writes its log.
    pub log_path: Option<PathBuf>,
    /// Seconds to wait after starting and after stopping.
    pub settle_seconds: Option<u64>,
}
