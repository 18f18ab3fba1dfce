//! Command to verify a registry file against a baseline.

use crate::error::CliError;
use crate::utils::{print_output, read_registry, resolve_configuration, GlobalOptions, OutputArg};
use bundledeps::fs::HostFileSystem;
use bundledeps::output::OutputFormat;
use bundledeps::process::SystemProcessRunner;
use bundledeps::{Outcome, Verifier};
use clap::Args;
use std::path::PathBuf;

/// Verify a registry written in baseline format.
#[derive(Args)]
pub struct VerifyCommand {
    /// Registry file, one `path description` entry per line
    #[arg(value_name = "REGISTRY_FILE")]
    pub registry: PathBuf,

    /// Baseline to compare against (defaults to the per-architecture file)
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub output: OutputArg,
}

impl VerifyCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = resolve_configuration(global, &SystemProcessRunner)?;
        let registry = read_registry(&self.registry)?;
        let baseline = self.baseline.unwrap_or_else(|| config.baseline_path());

        let verifier = Verifier::for_root(&config.root)?;
        match verifier.verify(&HostFileSystem, &baseline, &registry)? {
            Outcome::Completed(report) => {
                let formatter = OutputFormat::from(self.output).create_formatter();
                print_output(&formatter.verification(&report)?)?;
                report.ensure_passed()?;
            }
            Outcome::Skipped { reason } => {
                println!("Verification skipped: {reason}");
            }
        }
        Ok(())
    }
}
