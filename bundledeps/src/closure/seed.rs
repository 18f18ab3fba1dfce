//! Static entry points of the closure.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::resolver::ClosureResolver;
use crate::arch::Arch;
use crate::error::{Error, Result};
use crate::fs::FileSystem;

/// Root-relative entry points, with `{arch}` and `{version}` placeholders.
///
/// # Examples
///
/// ```
/// use bundledeps::{Arch, SeedSet};
/// use std::path::PathBuf;
///
/// let seeds = SeedSet::default().expand("/opt/homebrew".as_ref(), Arch::Aarch64, "9.0.2");
/// assert!(seeds.walk.contains(&PathBuf::from("/opt/homebrew/bin/qemu-system-aarch64")));
/// assert!(seeds.walk.contains(&PathBuf::from("/opt/homebrew/Cellar/qemu/9.0.2/bin")));
/// assert_eq!(seeds.direct, vec![PathBuf::from("/opt/homebrew/share/qemu")]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSet {
    /// Executables, walked and traced at runtime.
    pub executables: Vec<String>,
    /// Supporting directories, walked.
    pub support_dirs: Vec<String>,
    /// Resource directories, recorded as symlinks without walking.
    pub resource_dirs: Vec<String>,
}

impl Default for SeedSet {
    fn default() -> Self {
        Self {
            executables: vec![
                "bin/limactl".into(),
                "bin/qemu-img".into(),
                "bin/qemu-system-{arch}".into(),
            ],
            support_dirs: vec!["Cellar/qemu/{version}/bin".into()],
            resource_dirs: vec!["share/qemu".into()],
        }
    }
}

/// Absolute seeds after placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedSeeds {
    /// Paths walked through the resolver.
    pub walk: Vec<PathBuf>,
    /// Paths recorded directly.
    pub direct: Vec<PathBuf>,
}

impl SeedSet {
    /// Substitutes placeholders and anchors every entry under `root`.
    #[must_use]
    pub fn expand(&self, root: &Path, arch: Arch, version: &str) -> ExpandedSeeds {
        let anchor = |entry: &String| root.join(substitute(entry, arch, version));
        ExpandedSeeds {
            walk: self
                .executables
                .iter()
                .chain(&self.support_dirs)
                .map(anchor)
                .collect(),
            direct: self.resource_dirs.iter().map(anchor).collect(),
        }
    }

    /// File names of the executables, used to scope the file-access trace.
    #[must_use]
    pub fn executable_names(&self, arch: Arch, version: &str) -> Vec<String> {
        self.executables
            .iter()
            .filter_map(|entry| {
                Path::new(&substitute(entry, arch, version))
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .collect()
    }
}

fn substitute(entry: &str, arch: Arch, version: &str) -> String {
    entry
        .replace("{arch}", arch.as_str())
        .replace("{version}", version)
}

/// Seeds the registry with every static entry point.
///
/// Returns the number of entries added. Any failure is fatal and names the
/// seed that caused it.
///
/// # Errors
///
/// Returns [`Error::SeedResolution`] wrapping the underlying failure.
pub fn seed<F: FileSystem>(
    resolver: &mut ClosureResolver<F>,
    seeds: &SeedSet,
    arch: Arch,
    version: &str,
) -> Result<usize> {
    let expanded = seeds.expand(resolver.root(), arch, version);
    let before = resolver.registry().len();

    for path in &expanded.walk {
        log::info!("seeding {}", path.display());
        resolver.resolve(path).map_err(|e| wrap(path, e))?;
    }
    for path in &expanded.direct {
        log::info!("seeding resource directory {}", path.display());
        resolver.record_direct(path).map_err(|e| wrap(path, e))?;
    }

    Ok(resolver.registry().len() - before)
}

fn wrap(path: &Path, source: Error) -> Error {
    Error::SeedResolution {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}
