//! Process-execution capability.
//!
//! External tools (the tracer, the VM template runner, `brew`, `file`,
//! `otool`) are reached only through the [`ProcessRunner`] trait so the
//! closure components can be tested with scripted runners.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// A command line to execute.
///
/// # Examples
///
/// ```
/// use bundledeps::process::CommandSpec;
///
/// let spec = CommandSpec::new("limactl").arg("stop").arg("alpine");
/// assert_eq!(spec.to_string(), "limactl stop alpine");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to run, looked up on `PATH`.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Creates a command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builds a command from a full argument vector (program first).
    ///
    /// # Errors
    ///
    /// Returns a validation error if `argv` is empty.
    pub fn from_argv(field: &str, argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or_else(|| Error::Validation {
            field: field.to_string(),
            message: "command line cannot be empty".into(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, or `None` if the process was killed by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful output with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given status and stderr.
    #[must_use]
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns `true` if the command exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external commands.
///
/// `run` waits for the command and captures its output; `spawn_detached`
/// launches a background process with stdout redirected to a file and
/// returns once the launcher has exited.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Runs `command` to completion.
    ///
    /// A non-zero exit status is not an error at this level; callers decide
    /// with [`CommandOutput::success`] or [`run_checked`].
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started.
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;

    /// Starts a self-backgrounding `command` (such as `sudo -b ...`),
    /// writing its stdout to `stdout`.
    ///
    /// Only the launcher is waited for; the process it puts in the
    /// background keeps running.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file cannot be created, the program
    /// cannot be started, or the launcher exits unsuccessfully.
    fn spawn_detached(&self, command: &CommandSpec, stdout: &Path) -> Result<()>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        (**self).run(command)
    }

    fn spawn_detached(&self, command: &CommandSpec, stdout: &Path) -> Result<()> {
        (**self).spawn_detached(command, stdout)
    }
}

/// Runs `command` and turns a non-zero exit into [`Error::CommandFailed`].
///
/// # Errors
///
/// Returns an error if the program cannot be started or exits unsuccessfully.
pub fn run_checked<R: ProcessRunner + ?Sized>(
    runner: &R,
    command: &CommandSpec,
) -> Result<CommandOutput> {
    log::debug!("running {command}");
    let output = runner.run(command)?;
    if output.success() {
        Ok(output)
    } else {
        Err(Error::CommandFailed {
            command: command.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// [`ProcessRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(command, &e))?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&self, command: &CommandSpec, stdout: &Path) -> Result<()> {
        let file = File::create(stdout).map_err(|e| Error::from_io(stdout, e))?;
        // stderr stays unpiped: the backgrounded tracer would hold a pipe
        // open and block the read.
        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(command, &e))?
            .wait()
            .map_err(|e| spawn_error(command, &e))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: command.to_string(),
                status: status.code(),
                stderr: String::new(),
            })
        }
    }
}

fn spawn_error(command: &CommandSpec, err: &std::io::Error) -> Error {
    Error::Environment {
        reason: format!("cannot start `{command}`: {err}"),
    }
}
