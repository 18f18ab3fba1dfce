//! Utility functions for CLI operations.
//!
//! Configuration loading, registry files and output selection shared by the
//! commands.

use crate::error::CliError;
use bundledeps::config::{Config, ConfigBuilder, ResolvedConfig};
use bundledeps::output::OutputFormat;
use bundledeps::process::ProcessRunner;
use bundledeps::verify::parse_snapshot;
use bundledeps::{Arch, DependencyRegistry};
use clap::ValueEnum;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)] // verbose/quiet are consumed by the logger in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Configuration file used in place of the discovered project file.
    pub config: Option<PathBuf>,

    /// Installation root override.
    pub root: Option<PathBuf>,

    /// Architecture override.
    pub arch: Option<String>,
}

/// Report format selected on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Global options (highest priority)
/// 2. Environment variables
/// 3. Configuration files
/// 4. Built-in defaults (lowest priority)
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let mut overrides = Config::default();
    if let Some(root) = &global.root {
        overrides.root = Some(root.clone());
    }
    if let Some(arch) = &global.arch {
        overrides.arch = Some(
            Arch::from_str(arch).map_err(|e| CliError::InvalidArguments(e.to_string()))?,
        );
    }

    let mut builder = ConfigBuilder::new().with_config(overrides);
    if let Some(path) = &global.config {
        if !path.exists() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                path.display()
            )));
        }
        builder = builder.with_config_file(path);
    }

    builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Loads configuration and applies defaults, detecting the architecture
/// through `runner` when it is not configured.
pub fn resolve_configuration<R: ProcessRunner + ?Sized>(
    global: &GlobalOptions,
    runner: &R,
) -> Result<ResolvedConfig, CliError> {
    let config = load_configuration(global)?;
    ResolvedConfig::resolve(config, runner).map_err(CliError::from)
}

/// Reads a registry written in the baseline format.
pub fn read_registry(path: &Path) -> Result<DependencyRegistry, CliError> {
    if !path.exists() {
        return Err(CliError::InvalidArguments(format!(
            "File not found: {}",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&text)?;
    Ok(DependencyRegistry::from_snapshot(&snapshot)?)
}

/// Writes rendered output to stdout.
pub fn print_output(text: &str) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(text.as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        writeln!(handle)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_arg_maps_to_format() {
        assert_eq!(OutputFormat::from(OutputArg::Text), OutputFormat::Text);
        assert_eq!(OutputFormat::from(OutputArg::Json), OutputFormat::Json);
    }

    #[test]
    fn test_unknown_arch_is_an_argument_error() {
        let global = GlobalOptions {
            arch: Some("sparc".into()),
            ..Default::default()
        };
        let err = load_configuration(&global).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_missing_registry_file() {
        let err = read_registry(Path::new("/nonexistent/registry.txt")).unwrap_err();
        assert!(matches!(err, CliError::InvalidArguments(_)));
    }
}
