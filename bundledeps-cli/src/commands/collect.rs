//! Collect command implementation.
//!
//! Runs the full closure computation: static seeding, traced template runs,
//! trace ingestion and baseline verification.

use crate::error::CliError;
use crate::utils::{print_output, resolve_configuration, GlobalOptions, OutputArg};
use bundledeps::fs::HostFileSystem;
use bundledeps::output::OutputFormat;
use bundledeps::process::SystemProcessRunner;
use bundledeps::verify::write_snapshot;
use bundledeps::{CollectExecutor, CollectOptions, CollectPlan, Outcome};
use clap::Args;
use std::path::PathBuf;

/// Placeholder shown in dry runs when the qemu version is not configured.
const UNKNOWN_VERSION: &str = "<installed>";

/// Compute and verify the dependency closure.
#[derive(Args)]
pub struct CollectCommand {
    /// VM templates to exercise (defaults to the configured list)
    #[arg(value_name = "TEMPLATE")]
    pub templates: Vec<String>,

    /// Skip runtime discovery; only static seeds are resolved
    #[arg(long)]
    pub no_trace: bool,

    /// Skip baseline verification
    #[arg(long)]
    pub no_verify: bool,

    /// Show the planned steps without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub output: OutputArg,

    /// Write the resulting closure as a baseline snapshot
    #[arg(long, value_name = "FILE")]
    pub write_baseline: Option<PathBuf>,

    /// Write the resulting closure in baseline format for later `verify` or `stage`
    #[arg(long, value_name = "FILE")]
    pub registry_out: Option<PathBuf>,
}

impl CollectCommand {
    /// Execute the collect command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let runner = SystemProcessRunner;
        let config = resolve_configuration(global, &runner)?;

        let version = match (&config.qemu_version, self.dry_run) {
            (Some(version), _) => version.clone(),
            (None, true) => UNKNOWN_VERSION.to_string(),
            (None, false) => config.qemu_version(&runner)?,
        };

        let mut options = CollectOptions::new();
        if !self.templates.is_empty() {
            options = options.with_templates(self.templates);
        }
        if self.no_trace {
            options = options.without_trace();
        }
        if self.no_verify {
            options = options.without_verify();
        }
        if let Some(path) = self.write_baseline {
            options = options.with_write_baseline(path);
        }

        let plan = CollectPlan::new(options, &config).build_plan(&version);
        let mut executor = CollectExecutor::new(&HostFileSystem, &runner, &config);
        if self.dry_run {
            executor = executor.dry_run();
        }
        let result = executor.execute(&plan)?;

        let formatter = OutputFormat::from(self.output).create_formatter();
        print_output(&formatter.collect(&result)?)?;

        if let Some(path) = &self.registry_out {
            if !result.dry_run {
                write_snapshot(&HostFileSystem, path, &result.registry.to_snapshot())?;
            }
        }

        if let Some(Outcome::Completed(report)) = &result.verification {
            report.ensure_passed()?;
        }
        Ok(())
    }
}
