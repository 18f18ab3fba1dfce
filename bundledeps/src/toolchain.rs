//! Installed toolchain version lookup.

use crate::error::{Error, Result};
use crate::process::{run_checked, CommandSpec, ProcessRunner};

/// Returns the installed qemu version as reported by `brew list --versions`.
///
/// The output looks like `qemu 9.0.2`; when several versions are installed
/// the last one listed wins.
///
/// # Errors
///
/// Returns an environment error if `brew` fails or reports no version.
pub fn installed_qemu_version<R: ProcessRunner + ?Sized>(runner: &R) -> Result<String> {
    let command = CommandSpec::new("brew").args(["list", "--versions", "qemu"]);
    let output = run_checked(runner, &command)?;
    parse_version_listing(&output.stdout, "qemu").ok_or_else(|| Error::Environment {
        reason: "cannot determine installed qemu version: `brew list --versions qemu` printed nothing"
            .into(),
    })
}

fn parse_version_listing(stdout: &str, formula: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(formula))
        .filter_map(|rest| rest.split_whitespace().last())
        .last()
        .map(str::to_string)
}
