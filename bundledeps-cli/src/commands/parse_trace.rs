//! Command to list the qualifying events of a trace log.

use crate::error::CliError;
use crate::utils::{print_output, resolve_configuration, GlobalOptions, OutputArg};
use bundledeps::fs::{FileSystem, HostFileSystem};
use bundledeps::observe::TraceLogParser;
use bundledeps::output::OutputFormat;
use bundledeps::process::SystemProcessRunner;
use clap::Args;
use std::path::PathBuf;

/// Print the open/read events under the installation root.
///
/// The log is only read; it is neither resolved nor deleted.
#[derive(Args)]
pub struct ParseTraceCommand {
    /// fs_usage log file
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text", ignore_case = true)]
    pub output: OutputArg,
}

impl ParseTraceCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !self.log.exists() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                self.log.display()
            )));
        }
        let config = resolve_configuration(global, &SystemProcessRunner)?;
        let reader = HostFileSystem.open_buffered(&self.log)?;

        let events = TraceLogParser::new(&config.root)?
            .events(reader)
            .collect::<bundledeps::Result<Vec<_>>>()?;
        let formatter = OutputFormat::from(self.output).create_formatter();
        print_output(&formatter.trace_events(&events)?)
    }
}
