//! Host architecture and the fixed per-architecture tables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::process::{run_checked, CommandSpec, ProcessRunner};

/// Target CPU architecture of the bundle.
///
/// # Examples
///
/// ```
/// use bundledeps::Arch;
/// use std::path::Path;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch, Arch::Aarch64);
/// assert_eq!(arch.install_root(), Path::new("/opt/homebrew"));
/// assert_eq!(arch.baseline_file_name(), "deps-verification-arm64.txt");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// Intel Macs.
    #[serde(rename = "x86_64")]
    X86_64,
    /// Apple silicon.
    #[serde(rename = "aarch64", alias = "arm64")]
    Aarch64,
}

impl Arch {
    /// Maps a machine hardware name (`uname -m`) to an architecture.
    #[must_use]
    pub fn from_machine(machine: &str) -> Self {
        if machine.contains("86") {
            Self::X86_64
        } else {
            Self::Aarch64
        }
    }

    /// Detects the host architecture with `uname -m`.
    ///
    /// # Errors
    ///
    /// Returns an environment error if `uname` fails or prints nothing.
    pub fn detect<R: ProcessRunner + ?Sized>(runner: &R) -> Result<Self> {
        let output = run_checked(runner, &CommandSpec::new("uname").arg("-m"))?;
        let machine = output.stdout.trim();
        if machine.is_empty() {
            return Err(Error::Environment {
                reason: "cannot determine host architecture: `uname -m` printed nothing".into(),
            });
        }
        Ok(Self::from_machine(machine))
    }

    /// The package-manager installation root for this architecture.
    #[must_use]
    pub fn install_root(self) -> PathBuf {
        match self {
            Self::X86_64 => PathBuf::from("/usr/local"),
            Self::Aarch64 => PathBuf::from("/opt/homebrew"),
        }
    }

    /// File name of the baseline snapshot for this architecture.
    #[must_use]
    pub const fn baseline_file_name(self) -> &'static str {
        match self {
            Self::X86_64 => "deps-verification-x86.txt",
            Self::Aarch64 => "deps-verification-arm64.txt",
        }
    }

    /// Name used in `qemu-system-<arch>`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "x86-64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            other => Err(Error::Validation {
                field: "arch".into(),
                message: format!("unknown architecture '{other}' (expected x86_64 or aarch64)"),
            }),
        }
    }
}
