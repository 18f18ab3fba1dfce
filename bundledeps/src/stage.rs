//! Materializing a registry into a staging directory.
//!
//! Every key `<root>/<rel>` lands at `<dest>/<rel>`. Keys directly inside
//! `<root>/bin` are copied with their contents dereferenced, other symlinks are recreated
//! with their literal target, real files are copied and directories created.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::closure::{Annotation, DependencyRegistry};
use crate::error::{Error, Result};
use crate::fs::{lexical_normalize, FileSystem};

/// What was done for one registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    /// File contents copied through a `bin/` entry.
    CopiedDereferenced,
    /// Symlink recreated with the same literal target.
    Symlinked,
    /// Regular file copied.
    Copied,
    /// Directory created.
    CreatedDir,
}

/// One staged registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedEntry {
    /// The registry key.
    pub source: PathBuf,
    /// Where it was staged.
    pub dest: PathBuf,
    /// What was done.
    pub action: StageAction,
}

impl StagedEntry {
    /// Returns `true` if a regular file was written at `dest`.
    #[must_use]
    pub fn is_file_copy(&self) -> bool {
        matches!(
            self.action,
            StageAction::Copied | StageAction::CopiedDereferenced
        )
    }
}

/// Everything staged by one [`Stager::stage`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// The staging directory.
    pub dest_root: PathBuf,
    /// Staged keys in registry order.
    pub entries: Vec<StagedEntry>,
}

impl StageReport {
    /// Entries that produced regular files.
    pub fn copied_files(&self) -> impl Iterator<Item = &StagedEntry> {
        self.entries.iter().filter(|entry| entry.is_file_copy())
    }
}

/// Copies a registry out of the installation root.
///
/// # Examples
///
/// ```
/// use bundledeps::fs::{FileSystem, MockFileSystem};
/// use bundledeps::stage::Stager;
/// use bundledeps::{Annotation, DependencyRegistry};
/// use std::path::Path;
///
/// let fs = MockFileSystem::new()
///     .with_file("/r/Cellar/qemu/9.0/bin/qemu-img", 10)
///     .with_symlink("/r/opt/qemu", "../Cellar/qemu/9.0");
/// let mut registry = DependencyRegistry::new();
/// registry.insert("/r/opt/qemu".into(), Annotation::SymlinkTo("../Cellar/qemu/9.0".into()));
/// registry.insert("/r/Cellar/qemu/9.0/bin/qemu-img".into(), Annotation::RealFile("10B".into()));
///
/// let report = Stager::new(&fs, "/r", "/dist").stage(&registry).unwrap();
/// assert_eq!(report.entries.len(), 2);
/// assert_eq!(
///     fs.read_link(Path::new("/dist/opt/qemu")).unwrap(),
///     Some("../Cellar/qemu/9.0".into())
/// );
/// ```
#[derive(Debug)]
pub struct Stager<F> {
    fs: F,
    root: PathBuf,
    bin_dir: PathBuf,
    dest: PathBuf,
}

impl<F: FileSystem> Stager<F> {
    /// Creates a stager copying from `root` into `dest`.
    pub fn new(fs: F, root: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin_dir = root.join("bin");
        Self {
            fs,
            root,
            bin_dir,
            dest: dest.into(),
        }
    }

    /// The staging location of a registry key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `key` is not below the root.
    pub fn dest_for(&self, key: &Path) -> Result<PathBuf> {
        match key.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => Ok(self.dest.join(relative)),
            _ => Err(Error::InvalidPath {
                path: key.to_path_buf(),
                reason: format!("not inside {}", self.root.display()),
            }),
        }
    }

    /// Clears the destination and stages every registry key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the destination and the root
    /// overlap, in which case nothing is removed. Also returns an error if a
    /// key lies outside the root or any filesystem operation fails.
    pub fn stage(&self, registry: &DependencyRegistry) -> Result<StageReport> {
        self.check_disjoint()?;
        self.fs.remove_dir_all(&self.dest)?;
        self.fs.create_dir_all(&self.dest)?;

        let mut report = StageReport {
            dest_root: self.dest.clone(),
            entries: Vec::with_capacity(registry.len()),
        };
        for (key, annotation) in registry {
            let dest = self.dest_for(key)?;
            if let Some(parent) = dest.parent() {
                self.fs.create_dir_all(parent)?;
            }

            let action = self.stage_one(key, annotation, &dest)?;
            if action != StageAction::Symlinked {
                self.fs.set_owner_writable(&dest)?;
            }
            log::debug!("staged {} ({action:?})", key.display());
            report.entries.push(StagedEntry {
                source: key.clone(),
                dest,
                action,
            });
        }

        log::info!(
            "staged {} entries into {}",
            report.entries.len(),
            self.dest.display()
        );
        Ok(report)
    }

    /// Clearing a destination that contains the root, or lies inside it,
    /// would delete the installation.
    fn check_disjoint(&self) -> Result<()> {
        let root = lexical_normalize(&self.root);
        let dest = lexical_normalize(&self.dest);
        if dest.starts_with(&root) || root.starts_with(&dest) {
            return Err(Error::InvalidPath {
                path: self.dest.clone(),
                reason: format!(
                    "staging directory overlaps the installation root {}",
                    self.root.display()
                ),
            });
        }
        Ok(())
    }

    fn stage_one(&self, key: &Path, annotation: &Annotation, dest: &Path) -> Result<StageAction> {
        if key.parent() == Some(self.bin_dir.as_path()) {
            self.fs.copy_file(key, dest)?;
            return Ok(StageAction::CopiedDereferenced);
        }
        match annotation {
            Annotation::SymlinkTo(target) => {
                self.fs.symlink(target, dest)?;
                Ok(StageAction::Symlinked)
            }
            Annotation::RealFile(_) if self.fs.metadata(key)?.is_dir() => {
                self.fs.create_dir_all(dest)?;
                Ok(StageAction::CreatedDir)
            }
            Annotation::RealFile(_) => {
                self.fs.copy_file(key, dest)?;
                Ok(StageAction::Copied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn install() -> MockFileSystem {
        MockFileSystem::new()
            .with_file_contents("/r/Cellar/lima/1.0/bin/limactl", "limactl")
            .with_symlink("/r/bin/limactl", "../Cellar/lima/1.0/bin/limactl")
            .with_file_contents("/r/Cellar/zstd/1.5/lib/libzstd.1.5.dylib", "zstd")
            .with_symlink("/r/Cellar/zstd/1.5/lib/libzstd.1.dylib", "libzstd.1.5.dylib")
            .with_dir("/r/Cellar/qemu/9.0/bin")
    }

    fn registry() -> DependencyRegistry {
        let mut registry = DependencyRegistry::new();
        registry.insert(
            "/r/Cellar/zstd/1.5/lib/libzstd.1.dylib".into(),
            Annotation::SymlinkTo("libzstd.1.5.dylib".into()),
        );
        registry.insert(
            "/r/Cellar/zstd/1.5/lib/libzstd.1.5.dylib".into(),
            Annotation::RealFile("4B".into()),
        );
        registry.insert(
            "/r/Cellar/qemu/9.0/bin".into(),
            Annotation::RealFile("64B".into()),
        );
        registry
    }

    #[test]
    fn test_stage_layout() {
        let fs = install();
        let report = Stager::new(&fs, "/r", "/dist").stage(&registry()).unwrap();

        assert_eq!(report.entries.len(), 3);
        assert_eq!(
            fs.read_link(Path::new("/dist/Cellar/zstd/1.5/lib/libzstd.1.dylib"))
                .unwrap(),
            Some(PathBuf::from("libzstd.1.5.dylib"))
        );
        assert_eq!(
            fs.read_to_string(Path::new("/dist/Cellar/zstd/1.5/lib/libzstd.1.5.dylib"))
                .unwrap(),
            "zstd"
        );
        assert!(fs.metadata(Path::new("/dist/Cellar/qemu/9.0/bin")).unwrap().is_dir());
        assert_eq!(report.copied_files().count(), 1);
    }

    #[test]
    fn test_bin_entries_are_dereferenced() {
        let fs = install();
        let mut registry = DependencyRegistry::new();
        registry.insert(
            "/r/bin/limactl".into(),
            Annotation::SymlinkTo("../Cellar/lima/1.0/bin/limactl".into()),
        );

        let report = Stager::new(&fs, "/r", "/dist").stage(&registry).unwrap();

        assert_eq!(report.entries[0].action, StageAction::CopiedDereferenced);
        assert_eq!(fs.read_link(Path::new("/dist/bin/limactl")).unwrap(), None);
        assert_eq!(
            fs.read_to_string(Path::new("/dist/bin/limactl")).unwrap(),
            "limactl"
        );
    }

    #[test]
    fn test_destination_is_cleared_first() {
        let fs = install().with_file("/dist/stale", 1);
        Stager::new(&fs, "/r", "/dist").stage(&registry()).unwrap();
        assert!(!fs.contains("/dist/stale"));
    }

    #[test]
    fn test_overlapping_destination_is_rejected_untouched() {
        for dest in ["/r", "/", "/r/stage", "/r/Cellar/../"] {
            let fs = install();
            let err = Stager::new(&fs, "/r", dest)
                .stage(&registry())
                .unwrap_err();

            assert!(matches!(err, Error::InvalidPath { .. }), "{dest}: {err:?}");
            assert!(fs.contains("/r/Cellar/zstd/1.5/lib/libzstd.1.5.dylib"), "{dest}");
            assert!(fs.contains("/r/bin/limactl"), "{dest}");
        }
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_allowed() {
        let fs = install();
        let report = Stager::new(&fs, "/r", "/r-stage")
            .stage(&registry())
            .unwrap();
        assert_eq!(report.entries.len(), 3);
    }

    #[test]
    fn test_nested_bin_entries_keep_their_symlinks() {
        let fs = install().with_symlink("/r/bin/tools/lima", "../limactl");
        let mut registry = DependencyRegistry::new();
        registry.insert(
            "/r/bin/tools/lima".into(),
            Annotation::SymlinkTo("../limactl".into()),
        );

        let report = Stager::new(&fs, "/r", "/dist").stage(&registry).unwrap();

        assert_eq!(report.entries[0].action, StageAction::Symlinked);
        assert_eq!(
            fs.read_link(Path::new("/dist/bin/tools/lima")).unwrap(),
            Some(PathBuf::from("../limactl"))
        );
    }

    #[test]
    fn test_key_outside_root_is_rejected() {
        let fs = install().with_file("/elsewhere/file", 1);
        let mut registry = DependencyRegistry::new();
        registry.insert("/elsewhere/file".into(), Annotation::RealFile("1B".into()));

        let err = Stager::new(&fs, "/r", "/dist").stage(&registry).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }
}
