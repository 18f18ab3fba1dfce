//! CLI structure and command definitions.

use crate::commands::{
    CollectCommand, CompletionsCommand, NormalizeCommand, ParseTraceCommand, ResolveCommand,
    StageCommand, ValidateCommand, VerifyCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compute and verify the dependency closure of a lima + qemu installation.
#[derive(Parser)]
#[command(name = "bundledeps")]
#[command(
    version,
    about = "Compute and verify the dependency closure of installed executables",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file used instead of the discovered bundledeps.yaml
    #[arg(long, value_name = "PATH", global = true, env = "BUNDLEDEPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Installation root (defaults per architecture)
    #[arg(long, value_name = "PATH", global = true)]
    pub root: Option<PathBuf>,

    /// Target architecture: x86_64 or aarch64 (defaults to the host)
    #[arg(long, value_name = "ARCH", global = true)]
    pub arch: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Compute the full closure and verify it against the baseline
    Collect(CollectCommand),

    /// Resolve paths and print the registry
    Resolve(ResolveCommand),

    /// Verify a registry file against a baseline
    Verify(VerifyCommand),

    /// Print version-agnostic keys for paths
    Normalize(NormalizeCommand),

    /// Print the qualifying events of a trace log
    ParseTrace(ParseTraceCommand),

    /// Stage a registry and plan linkage fixes
    Stage(StageCommand),

    /// Validate a configuration file
    Validate(ValidateCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
