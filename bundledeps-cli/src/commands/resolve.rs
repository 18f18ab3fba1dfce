//! Command to resolve individual paths into a registry.

use crate::error::CliError;
use crate::utils::{print_output, resolve_configuration, GlobalOptions, OutputArg};
use bundledeps::fs::HostFileSystem;
use bundledeps::output::OutputFormat;
use bundledeps::process::SystemProcessRunner;
use bundledeps::ClosureResolver;
use clap::Args;
use std::path::PathBuf;

/// Resolve symlink chains under the installation root.
#[derive(Args)]
pub struct ResolveCommand {
    /// Absolute paths under the installation root
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub output: OutputArg,
}

impl ResolveCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = resolve_configuration(global, &SystemProcessRunner)?;

        let mut resolver = ClosureResolver::new(HostFileSystem, &config.root)
            .with_max_hops(config.max_symlink_hops);
        resolver.resolve_all(self.paths)?;

        let formatter = OutputFormat::from(self.output).create_formatter();
        print_output(&formatter.registry(resolver.registry())?)
    }
}
