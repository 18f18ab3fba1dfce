//! Common test utilities for integration tests.
//!
//! [`InstallTree`] builds a throwaway installation root with real files and
//! symlinks; [`FakeRunner`] stands in for external commands.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bundledeps::process::{CommandOutput, CommandSpec, ProcessRunner};
use bundledeps::Result;
use tempfile::TempDir;

/// A temporary installation root.
///
/// The root is canonicalized so that no ancestor of it is a symlink.
pub struct InstallTree {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)]
impl InstallTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap().join("root");
        fs::create_dir_all(&root).unwrap();
        Self { _temp: temp, root }
    }

    /// The installation root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<relative>`.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// A scratch location next to the root, outside it.
    pub fn outside(&self, relative: &str) -> PathBuf {
        self.root.parent().unwrap().join(relative)
    }

    /// Writes a file of `len` bytes.
    pub fn file(self, relative: &str, len: usize) -> Self {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'x'; len]).unwrap();
        self
    }

    /// Creates a directory.
    pub fn dir(self, relative: &str) -> Self {
        fs::create_dir_all(self.path(relative)).unwrap();
        self
    }

    /// Creates a symlink at `relative` pointing at `target` verbatim.
    pub fn link(self, relative: &str, target: &str) -> Self {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        symlink(target, &path).unwrap();
        self
    }

    /// A root-anchored fs_usage line for `relative`.
    pub fn trace_line(&self, operation: &str, relative: &str) -> String {
        format!(
            "10:00:00.100  {operation}  F=3  (R_____)  {}  0.000010   qemu-system-aarch64.4242\n",
            self.path(relative).display()
        )
    }
}

type Responder = Box<dyn Fn(&CommandSpec) -> CommandOutput + Send + Sync>;

/// Records every command and answers with a scripted responder.
///
/// `spawn_detached` writes `trace_output` to the requested stdout file.
pub struct FakeRunner {
    calls: Mutex<Vec<String>>,
    responder: Responder,
    trace_output: String,
}

#[allow(dead_code)]
impl FakeRunner {
    /// Succeeds with empty output for every command.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(|_| CommandOutput::ok("")),
            trace_output: String::new(),
        }
    }

    /// Answers with `responder`.
    pub fn responding(
        mut self,
        responder: impl Fn(&CommandSpec) -> CommandOutput + Send + Sync + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Content the fake tracer writes.
    pub fn with_trace_output(mut self, output: impl Into<String>) -> Self {
        self.trace_output = output.into();
        self
    }

    /// Every command seen so far, rendered.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.to_string());
        Ok((self.responder)(command))
    }

    fn spawn_detached(&self, command: &CommandSpec, stdout: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(format!("spawn {command}"));
        fs::write(stdout, &self.trace_output)?;
        Ok(())
    }
}
