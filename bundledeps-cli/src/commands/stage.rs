//! Command to stage a registry and plan its linkage fixes.

use crate::error::CliError;
use crate::utils::{print_output, read_registry, resolve_configuration, GlobalOptions, OutputArg};
use bundledeps::fs::HostFileSystem;
use bundledeps::linkage::LinkagePlanner;
use bundledeps::output::OutputFormat;
use bundledeps::process::SystemProcessRunner;
use bundledeps::stage::Stager;
use clap::Args;
use std::path::PathBuf;

/// Copy a registry into a staging directory and emit the linkage plan.
#[derive(Args)]
pub struct StageCommand {
    /// Registry file, one `path description` entry per line
    #[arg(value_name = "REGISTRY_FILE")]
    pub registry: PathBuf,

    /// Staging directory (cleared first; defaults to the configured one)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Write the linkage plan as JSON
    #[arg(long, value_name = "FILE")]
    pub plan_out: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub output: OutputArg,
}

impl StageCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let runner = SystemProcessRunner;
        let config = resolve_configuration(global, &runner)?;
        let dest = self
            .dest
            .or_else(|| config.stage_dir.clone())
            .ok_or_else(|| {
                CliError::InvalidArguments("no staging directory: pass --dest".to_string())
            })?;
        if !dest.is_absolute() {
            return Err(CliError::InvalidArguments(format!(
                "staging directory {} must be absolute",
                dest.display()
            )));
        }

        let registry = read_registry(&self.registry)?;
        let report = Stager::new(HostFileSystem, &config.root, dest).stage(&registry)?;
        let plan = LinkagePlanner::new(&runner, &config.root, config.arch)?.plan(&report);

        if let Some(path) = &self.plan_out {
            std::fs::write(path, plan.to_json()?)?;
        }

        let formatter = OutputFormat::from(self.output).create_formatter();
        print_output(&formatter.stage(&report, &plan)?)
    }
}
