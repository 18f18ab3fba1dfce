//! Symlink-chain resolution into the registry.
//!
//! A raw path is walked one segment at a time. Whenever the prefix built so
//! far is a symlink, the link is recorded (unless it lives in `<root>/bin`),
//! its target is spliced in front of the unconsumed segments, and the walk
//! restarts on that candidate. When every segment is consumed the prefix is
//! the real file and is recorded with its size.

use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use super::registry::{Annotation, DependencyRegistry};
use crate::error::{Error, Result};
use crate::fs::{human_size, lexical_normalize, FileSystem};

/// Default bound on the number of symlinks followed in one chain.
pub const DEFAULT_MAX_HOPS: usize = 40;

#[derive(Debug, Clone)]
struct Pending {
    raw: PathBuf,
    trail: Vec<PathBuf>,
}

/// Walk state shared by every resolution against one registry.
///
/// `visited` is keyed on raw paths exactly as they were handed in or
/// produced by splicing a link target, before any resolution.
#[derive(Debug, Default)]
pub struct Traversal {
    visited: HashSet<PathBuf>,
    queue: VecDeque<Pending>,
}

impl Traversal {
    /// Returns `true` if `raw` has already been walked.
    #[must_use]
    pub fn is_visited(&self, raw: &Path) -> bool {
        self.visited.contains(raw)
    }

    /// Number of raw paths walked so far.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn push(&mut self, raw: PathBuf, trail: Vec<PathBuf>) {
        self.queue.push_back(Pending { raw, trail });
    }
}

/// Resolves raw paths into a [`DependencyRegistry`].
///
/// # Examples
///
/// ```
/// use bundledeps::fs::MockFileSystem;
/// use bundledeps::{Annotation, ClosureResolver};
/// use std::path::Path;
///
/// let fs = MockFileSystem::new()
///     .with_file("/r/Cellar/zstd/1.5.6/lib/libzstd.1.5.6.dylib", 700 * 1024)
///     .with_symlink("/r/Cellar/zstd/1.5.6/lib/libzstd.1.dylib", "libzstd.1.5.6.dylib")
///     .with_symlink("/r/opt/zstd", "../Cellar/zstd/1.5.6");
///
/// let mut resolver = ClosureResolver::new(&fs, "/r");
/// resolver.resolve(Path::new("/r/opt/zstd/lib/libzstd.1.dylib")).unwrap();
///
/// let registry = resolver.registry();
/// assert_eq!(registry.len(), 3);
/// assert_eq!(
///     registry.get(Path::new("/r/Cellar/zstd/1.5.6/lib/libzstd.1.5.6.dylib")),
///     Some(&Annotation::RealFile("700K".into()))
/// );
/// ```
#[derive(Debug)]
pub struct ClosureResolver<F> {
    fs: F,
    root: PathBuf,
    bin_dir: PathBuf,
    max_hops: usize,
    registry: DependencyRegistry,
    traversal: Traversal,
}

impl<F: FileSystem> ClosureResolver<F> {
    /// Creates a resolver for the installation rooted at `root`.
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin_dir = root.join("bin");
        Self {
            fs,
            root,
            bin_dir,
            max_hops: DEFAULT_MAX_HOPS,
            registry: DependencyRegistry::new(),
            traversal: Traversal::default(),
        }
    }

    /// Sets the bound on symlinks followed per chain.
    #[must_use]
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Continues from an existing registry.
    ///
    /// Raw paths are not remembered across registries, so keys already
    /// present are simply not re-recorded.
    #[must_use]
    pub fn with_registry(mut self, registry: DependencyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The installation root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The filesystem capability.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// The registry built so far.
    #[must_use]
    pub fn registry(&self) -> &DependencyRegistry {
        &self.registry
    }

    /// The traversal state.
    #[must_use]
    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    /// Consumes the resolver, yielding the registry.
    #[must_use]
    pub fn into_registry(self) -> DependencyRegistry {
        self.registry
    }

    /// Resolves one raw path and returns how many entries were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is relative, an absolute link target
    /// escapes the root, a chain loops or exceeds the hop limit, or the
    /// final file cannot be inspected.
    pub fn resolve(&mut self, raw: &Path) -> Result<usize> {
        self.resolve_all(std::iter::once(raw.to_path_buf()))
    }

    /// Resolves several raw paths and returns how many entries were added.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal error, see [`Self::resolve`].
    pub fn resolve_all<I>(&mut self, raws: I) -> Result<usize>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let before = self.registry.len();
        for raw in raws {
            self.traversal.push(raw, Vec::new());
        }
        while let Some(pending) = self.traversal.queue.pop_front() {
            if let Err(e) = self.step(pending) {
                self.traversal.queue.clear();
                return Err(e);
            }
        }
        Ok(self.registry.len() - before)
    }

    /// Records `path` as `SymlinkTo(readlink(path))` without walking it.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is missing or not a symlink.
    pub fn record_direct(&mut self, path: &Path) -> Result<bool> {
        let target = self.fs.read_link(path)?.ok_or_else(|| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "expected a symlink".into(),
        })?;
        Ok(self
            .registry
            .insert(path.to_path_buf(), Annotation::SymlinkTo(target)))
    }

    fn step(&mut self, pending: Pending) -> Result<()> {
        let Pending { raw, mut trail } = pending;

        if trail.contains(&raw) {
            return Err(Error::SymlinkLoop { path: raw });
        }
        if self.traversal.is_visited(&raw) {
            return Ok(());
        }
        if !raw.is_absolute() {
            return Err(Error::NotAbsolute { path: raw });
        }
        if trail.len() > self.max_hops {
            return Err(Error::InvalidPath {
                path: trail.first().cloned().unwrap_or_else(|| raw.clone()),
                reason: format!("too many symlinks (max {})", self.max_hops),
            });
        }
        self.traversal.visited.insert(raw.clone());

        let segments = segments(&raw);
        let mut prefix = PathBuf::from("/");
        for (index, segment) in segments.iter().enumerate() {
            if segment == ".." {
                prefix.pop();
                continue;
            }
            let candidate = prefix.join(segment);
            let Some(target) = self.fs.read_link(&candidate)? else {
                prefix = candidate;
                continue;
            };

            if candidate.parent() != Some(self.bin_dir.as_path()) {
                self.registry
                    .insert(candidate.clone(), Annotation::SymlinkTo(target.clone()));
            }

            let mut next = if target.is_absolute() {
                if !lexical_normalize(&target).starts_with(&self.root) {
                    return Err(Error::LinkEscapesRoot {
                        link: candidate,
                        target,
                        root: self.root.clone(),
                    });
                }
                target
            } else {
                prefix.join(&target)
            };
            for rest in &segments[index + 1..] {
                next.push(rest);
            }

            trail.push(raw);
            self.traversal.push(next, trail);
            return Ok(());
        }

        let info = self.fs.metadata(&prefix)?;
        self.registry
            .insert(prefix, Annotation::RealFile(human_size(info.len)));
        Ok(())
    }
}

/// Splits an absolute path into its names, keeping `..` and dropping the
/// root, `.` and empty segments.
fn segments(path: &Path) -> Vec<OsString> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_os_string()),
            Component::ParentDir => Some(OsString::from("..")),
            _ => None,
        })
        .collect()
}
