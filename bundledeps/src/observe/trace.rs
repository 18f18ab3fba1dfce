//! Background file-access tracing.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::process::{run_checked, CommandSpec, ProcessRunner};

/// How the tracer is started and stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Command prefix; the traced executable names are appended.
    pub start: Vec<String>,
    /// Command that stops every running tracer.
    pub stop: Vec<String>,
    /// File receiving the tracer's stdout.
    pub log_path: PathBuf,
    /// Delay after starting and after stopping.
    pub settle: Duration,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            start: ["sudo", "-b", "fs_usage", "-w", "-f", "pathname"]
                .map(String::from)
                .to_vec(),
            stop: ["sudo", "pkill", "fs_usage"].map(String::from).to_vec(),
            log_path: PathBuf::from("/tmp/fs_usage.log"),
            settle: Duration::from_secs(2),
        }
    }
}

impl TraceConfig {
    /// The start command scoped to `executables`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the start command is empty.
    pub fn start_command(&self, executables: &[String]) -> Result<CommandSpec> {
        Ok(CommandSpec::from_argv("trace.program", &self.start)?.args(executables.iter().cloned()))
    }

    /// The stop command.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the stop command is empty.
    pub fn stop_command(&self) -> Result<CommandSpec> {
        CommandSpec::from_argv("trace.stop", &self.stop)
    }
}

/// A running tracer.
///
/// The tracer is a detached process; the session only remembers how to stop
/// it and where its log goes.
#[derive(Debug)]
pub struct TraceSession<'r, R: ProcessRunner + ?Sized> {
    runner: &'r R,
    config: TraceConfig,
}

impl<'r, R: ProcessRunner + ?Sized> TraceSession<'r, R> {
    /// Starts the tracer for `executables` and waits for it to settle.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracer cannot be started.
    pub fn start(runner: &'r R, config: TraceConfig, executables: &[String]) -> Result<Self> {
        let command = config.start_command(executables)?;
        log::info!("starting trace: {command} > {}", config.log_path.display());
        runner.spawn_detached(&command, &config.log_path)?;
        settle(config.settle);
        Ok(Self { runner, config })
    }

    /// Where the tracer writes.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.config.log_path
    }

    /// Stops the tracer, waits for it to settle, and returns the log path.
    ///
    /// # Errors
    ///
    /// Returns an error if the stop command fails.
    pub fn stop(self) -> Result<PathBuf> {
        let command = self.config.stop_command()?;
        log::info!("stopping trace: {command}");
        run_checked(self.runner, &command)?;
        settle(self.config.settle);
        Ok(self.config.log_path)
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
