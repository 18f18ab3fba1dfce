//! Command to print version-agnostic keys.

use crate::error::CliError;
use crate::utils::{print_output, resolve_configuration, GlobalOptions, OutputArg};
use bundledeps::output::OutputFormat;
use bundledeps::process::SystemProcessRunner;
use bundledeps::Normalizer;
use clap::Args;
use std::path::PathBuf;

/// Print the normalized key of each path.
#[derive(Args)]
pub struct NormalizeCommand {
    /// Paths to normalize
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub output: OutputArg,
}

impl NormalizeCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = resolve_configuration(global, &SystemProcessRunner)?;
        let normalizer = Normalizer::for_root(&config.root)?;

        let keys: Vec<(PathBuf, String)> = self
            .paths
            .into_iter()
            .map(|path| {
                let key = normalizer.normalize(&path);
                (path, key)
            })
            .collect();

        let formatter = OutputFormat::from(self.output).create_formatter();
        print_output(&formatter.normalized(&keys)?)
    }
}
