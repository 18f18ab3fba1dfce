//! Planning dynamic-library rewrites for staged binaries.
//!
//! Staged Mach-O files still reference libraries by absolute install path.
//! The plan lists, per file, every `<root>/<dylib>` reference to rewrite to
//! `@executable_path/../<dylib>` and whether the file must be re-signed
//! afterwards. Applying the plan is left to external tooling.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::arch::Arch;
use crate::error::{Outcome, Result};
use crate::process::{run_checked, CommandSpec, ProcessRunner};
use crate::stage::{StageReport, StagedEntry};

/// One load-command rewrite.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DylibRewrite {
    /// The absolute reference found in the binary.
    pub from: String,
    /// The relocatable replacement.
    pub to: String,
}

/// Planned work for one staged Mach-O file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkageEntry {
    /// The installed file that was inspected.
    pub source: PathBuf,
    /// The staged copy to modify.
    pub dest: PathBuf,
    /// Rewrites to apply, sorted.
    pub rewrites: Vec<DylibRewrite>,
    /// Whether the staged copy must be re-signed.
    pub resign: bool,
}

/// A staged file that could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// The staged path.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// The full rewrite and re-sign plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkagePlan {
    /// Mach-O files needing work.
    pub entries: Vec<LinkageEntry>,
    /// Files skipped after an inspection failure.
    pub skipped: Vec<SkippedFile>,
}

impl LinkagePlan {
    /// Staged paths to re-sign.
    pub fn resign_targets(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .filter(|entry| entry.resign)
            .map(|entry| entry.dest.as_path())
    }

    /// Pretty-printed JSON for the external rewriter.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds a [`LinkagePlan`] with `file` and `otool -L`.
#[derive(Debug)]
pub struct LinkagePlanner<'r, R: ?Sized> {
    runner: &'r R,
    root: String,
    arch: Arch,
    reference: Regex,
}

impl<'r, R: ProcessRunner + ?Sized> LinkagePlanner<'r, R> {
    /// Creates a planner for binaries installed under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the reference pattern fails to compile.
    pub fn new(runner: &'r R, root: &Path, arch: Arch) -> Result<Self> {
        let root = root.to_string_lossy().into_owned();
        let reference = Regex::new(&format!(r"{}/(\S+)", regex::escape(&root)))?;
        Ok(Self {
            runner,
            root,
            arch,
            reference,
        })
    }

    /// Plans every copied file of a stage report.
    ///
    /// Per-file inspection failures are logged and recorded as skipped.
    #[must_use]
    pub fn plan(&self, report: &StageReport) -> LinkagePlan {
        let mut plan = LinkagePlan::default();
        for staged in report.copied_files() {
            match self.plan_file(staged) {
                Outcome::Completed(Some(entry)) => plan.entries.push(entry),
                Outcome::Completed(None) => {}
                Outcome::Skipped { reason } => {
                    log::warn!("skipping linkage for {}: {reason}", staged.dest.display());
                    plan.skipped.push(SkippedFile {
                        path: staged.dest.clone(),
                        reason,
                    });
                }
            }
        }
        plan
    }

    /// Plans one staged file; `None` means it is not a Mach-O file.
    pub fn plan_file(&self, staged: &StagedEntry) -> Outcome<Option<LinkageEntry>> {
        let description = match self.inspect(CommandSpec::new("file").arg(path_arg(&staged.dest))) {
            Ok(stdout) => stdout,
            Err(e) => return Outcome::skipped(format!("classification failed: {e}")),
        };
        if !description.contains("Mach-O") {
            return Outcome::Completed(None);
        }

        let listing = match self.inspect(
            CommandSpec::new("otool")
                .arg("-L")
                .arg(path_arg(&staged.source)),
        ) {
            Ok(stdout) => stdout,
            Err(e) => return Outcome::skipped(format!("otool failed: {e}")),
        };

        let rewrites: BTreeSet<DylibRewrite> = listing
            .lines()
            .filter(|line| !line.trim_end().ends_with(':'))
            .filter_map(|line| self.reference.captures(line))
            .map(|captures| DylibRewrite {
                from: format!("{}/{}", self.root, &captures[1]),
                to: format!("@executable_path/../{}", &captures[1]),
            })
            .collect();

        let is_emulator = staged
            .source
            .ends_with(format!("bin/qemu-system-{}", self.arch));
        let resign = is_emulator || (self.arch == Arch::Aarch64 && !rewrites.is_empty());

        if rewrites.is_empty() && !resign {
            return Outcome::Completed(None);
        }
        Outcome::Completed(Some(LinkageEntry {
            source: staged.source.clone(),
            dest: staged.dest.clone(),
            rewrites: rewrites.into_iter().collect(),
            resign,
        }))
    }

    fn inspect(&self, command: CommandSpec) -> Result<String> {
        run_checked(self.runner, &command).map(|output| output.stdout)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockProcessRunner};
    use crate::stage::StageAction;

    fn staged(source: &str, dest: &str) -> StagedEntry {
        StagedEntry {
            source: source.into(),
            dest: dest.into(),
            action: StageAction::Copied,
        }
    }

    fn runner(file_output: &'static str, otool_output: &'static str) -> MockProcessRunner {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(move |cmd| match cmd.program.as_str() {
            "file" => Ok(CommandOutput::ok(file_output)),
            "otool" => Ok(CommandOutput::ok(otool_output)),
            other => panic!("unexpected command {other}"),
        });
        runner
    }

    const OTOOL: &str = "/opt/homebrew/Cellar/qemu/9.0/bin/qemu-img:\n\
        \t/opt/homebrew/opt/glib/lib/libglib-2.0.0.dylib (compatibility version 8201.0.0, current version 8201.4.0)\n\
        \t/opt/homebrew/opt/zstd/lib/libzstd.1.dylib (compatibility version 1.0.0, current version 1.5.6)\n\
        \t/usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1345.0.0)\n";

    #[test]
    fn test_rewrites_planned_for_root_references() {
        let runner = runner("Mach-O 64-bit executable arm64", OTOOL);
        let planner = LinkagePlanner::new(&runner, Path::new("/opt/homebrew"), Arch::Aarch64).unwrap();

        let entry = planner
            .plan_file(&staged("/opt/homebrew/Cellar/qemu/9.0/bin/qemu-img", "/dist/Cellar/qemu/9.0/bin/qemu-img"))
            .completed()
            .unwrap()
            .unwrap();

        assert_eq!(
            entry.rewrites,
            vec![
                DylibRewrite {
                    from: "/opt/homebrew/opt/glib/lib/libglib-2.0.0.dylib".into(),
                    to: "@executable_path/../opt/glib/lib/libglib-2.0.0.dylib".into(),
                },
                DylibRewrite {
                    from: "/opt/homebrew/opt/zstd/lib/libzstd.1.dylib".into(),
                    to: "@executable_path/../opt/zstd/lib/libzstd.1.dylib".into(),
                },
            ]
        );
        assert!(entry.resign);
    }

    #[test]
    fn test_x86_resigns_only_the_emulator() {
        let runner = runner("Mach-O 64-bit executable x86_64", OTOOL);
        let planner = LinkagePlanner::new(&runner, Path::new("/opt/homebrew"), Arch::X86_64).unwrap();

        let img = planner
            .plan_file(&staged("/opt/homebrew/Cellar/qemu/9.0/bin/qemu-img", "/dist/a"))
            .completed()
            .unwrap()
            .unwrap();
        assert!(!img.resign);

        let emulator = planner
            .plan_file(&staged(
                "/opt/homebrew/Cellar/qemu/9.0/bin/qemu-system-x86_64",
                "/dist/b",
            ))
            .completed()
            .unwrap()
            .unwrap();
        assert!(emulator.resign);
    }

    #[test]
    fn test_non_mach_o_files_are_ignored() {
        let runner = runner("ASCII text", "");
        let planner = LinkagePlanner::new(&runner, Path::new("/opt/homebrew"), Arch::Aarch64).unwrap();

        assert_eq!(
            planner.plan_file(&staged("/opt/homebrew/share/x", "/dist/share/x")),
            Outcome::Completed(None)
        );
    }

    #[test]
    fn test_inspection_failure_is_skipped_with_warning() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandOutput::failed(1, "cannot open")));
        let planner = LinkagePlanner::new(&runner, Path::new("/opt/homebrew"), Arch::Aarch64).unwrap();

        let report = StageReport {
            dest_root: "/dist".into(),
            entries: vec![staged("/opt/homebrew/lib/a.dylib", "/dist/lib/a.dylib")],
        };
        let plan = planner.plan(&report);
        assert!(plan.entries.is_empty());
        assert_eq!(plan.skipped.len(), 1);
        assert!(plan.skipped[0].reason.contains("classification failed"));
    }

    #[test]
    fn test_plan_json() {
        let plan = LinkagePlan {
            entries: vec![LinkageEntry {
                source: "/r/bin/x".into(),
                dest: "/dist/bin/x".into(),
                rewrites: Vec::new(),
                resign: true,
            }],
            skipped: Vec::new(),
        };
        let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(json["entries"][0]["resign"], true);
        assert_eq!(plan.resign_targets().count(), 1);
    }
}
