//! Common test utilities for CLI integration tests.
//!
//! [`TestEnv`] isolates every run: a throwaway installation root, a fake
//! home directory and a working directory with no project config.

use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables the binary reads that must not leak in from the host.
const ISOLATED_VARS: [&str; 10] = [
    "BUNDLEDEPS_CONFIG",
    "BUNDLEDEPS_ROOT",
    "BUNDLEDEPS_ARCH",
    "BUNDLEDEPS_QEMU_VERSION",
    "BUNDLEDEPS_TEMPLATES",
    "BUNDLEDEPS_BASELINE_DIR",
    "BUNDLEDEPS_TRACE_LOG",
    "BUNDLEDEPS_SETTLE_SECONDS",
    "BUNDLEDEPS_MAX_SYMLINK_HOPS",
    "BUNDLEDEPS_LOG_MODE",
];

/// Test environment with an isolated installation root.
pub struct TestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Scratch area outside the root.
    pub temp_path: PathBuf,
    /// Installation root passed with `--root`.
    pub root: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Creates an empty environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = fs::canonicalize(temp_dir.path()).expect("Failed to canonicalize");
        let root = temp_path.join("root");
        fs::create_dir_all(&root).expect("Failed to create root");
        fs::create_dir_all(temp_path.join("home")).expect("Failed to create home");
        fs::create_dir_all(temp_path.join("work")).expect("Failed to create work dir");

        Self {
            temp_dir,
            temp_path,
            root,
        }
    }

    /// The binary with a clean environment and no global flags.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("bundledeps").expect("Failed to find bundledeps binary");
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.temp_path.join("home"))
            .current_dir(self.temp_path.join("work"));
        cmd
    }

    /// The binary with `--root` and `--arch aarch64` preset.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--root").arg(&self.root).arg("--arch").arg("aarch64");
        cmd
    }

    /// `<root>/<relative>`.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// A path in the scratch area.
    pub fn scratch(&self, relative: &str) -> PathBuf {
        self.temp_path.join(relative)
    }

    /// Writes a file of `len` bytes under the root.
    pub fn file(&self, relative: &str, len: usize) -> &Self {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'x'; len]).unwrap();
        self
    }

    /// Creates a symlink under the root pointing at `target` verbatim.
    pub fn link(&self, relative: &str, target: &str) -> &Self {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        symlink(target, &path).unwrap();
        self
    }

    /// Writes a scratch file and returns its path.
    pub fn write_scratch(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.scratch(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// A registry line for `relative` in the baseline format.
    pub fn entry(&self, relative: &str, description: &str) -> String {
        format!("{} {description}\n", self.path(relative).display())
    }

    /// Runs `resolve` for `paths` and returns stdout.
    pub fn resolve(&self, paths: &[&str]) -> String {
        let mut cmd = self.command();
        cmd.arg("resolve");
        for path in paths {
            cmd.arg(self.path(path));
        }
        let output = cmd.output().expect("Failed to run resolve");
        assert!(
            output.status.success(),
            "Resolve failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("Invalid UTF-8 in output")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Asserts `path` exists and is not a symlink.
#[allow(dead_code)]
pub fn assert_regular(path: &Path) {
    let meta = fs::symlink_metadata(path).expect("staged path missing");
    assert!(!meta.file_type().is_symlink(), "{} is a symlink", path.display());
}
