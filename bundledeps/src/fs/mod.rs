//! Filesystem capability used by the closure components.
//!
//! Every filesystem query the resolver, observer and stager make goes
//! through the [`FileSystem`] trait. [`HostFileSystem`] talks to the real
//! filesystem with native calls; [`MockFileSystem`] is an in-memory tree for
//! deterministic tests.

mod host;
mod mock;
mod size;

use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use host::HostFileSystem;
pub use mock::MockFileSystem;
pub use size::human_size;

/// Kind of a filesystem object after symlinks are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Anything else (sockets, devices, fifos).
    Other,
}

/// Identity of a filesystem object, equal for two paths that reach the same
/// inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    /// Device number.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
}

/// Metadata of a filesystem object, with symlinks followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// What kind of object this is.
    pub kind: FileKind,
    /// Size in bytes.
    pub len: u64,
    /// Identity used for same-file comparisons.
    pub id: FileId,
}

impl FileInfo {
    /// Returns `true` for regular files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Returns `true` for directories.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Filesystem operations needed to compute and stage a dependency closure.
///
/// Query methods follow symlinks unless stated otherwise. The provided
/// [`FileSystem::find_same_file`] walks a tree with `read_dir` and
/// `metadata`, so implementations only supply the primitives.
pub trait FileSystem {
    /// Returns the literal target of `path` if `path` itself is a symlink,
    /// or `None` if it exists and is not one.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if `path` does not exist.
    fn read_link(&self, path: &Path) -> Result<Option<PathBuf>>;

    /// Returns metadata for `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if `path` (or a symlink target) does not exist.
    fn metadata(&self, path: &Path) -> Result<FileInfo>;

    /// Lists the entries of a directory as `path.join(name)`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a readable directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Reads a whole file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Opens a file for buffered reading, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns `PathNotFound` if the file does not exist, or another error
    /// if it cannot be opened.
    fn open_buffered(&self, path: &Path) -> Result<Box<dyn BufRead>>;

    /// Creates or truncates a file and writes `contents` to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory is missing or the file
    /// cannot be written.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Removes a file (or symlink).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Removes a directory tree if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree exists but cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Creates a directory and all missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copies file contents from `from` to `to`, following symlinks on
    /// `from`.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Creates a symlink at `link` whose literal target is `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, target: &Path, link: &Path) -> Result<()>;

    /// Adds the owner-write permission bit to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the permissions cannot be changed.
    fn set_owner_writable(&self, path: &Path) -> Result<()>;

    /// Returns `true` if `path` exists (following symlinks).
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }

    /// Returns `true` if `path` is a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool {
        self.metadata(path).is_ok_and(|info| info.is_file())
    }

    /// Finds every path below `search_root` that reaches the same file as
    /// `target`, descending through symlinked directories.
    ///
    /// The result is the equivalent of `find -L <search_root> -samefile
    /// <target>` and may include `target` itself. Unreadable directories and
    /// dangling links below the root are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` or `search_root` cannot be inspected.
    fn find_same_file(&self, search_root: &Path, target: &Path) -> Result<Vec<PathBuf>> {
        let wanted = self.metadata(target)?.id;
        let root_info = self.metadata(search_root)?;

        let mut found = Vec::new();
        // Each pending directory carries the identities of its ancestors so a
        // symlink pointing back up the tree is not descended twice, while two
        // aliases of the same directory are both explored.
        let mut stack: Vec<(PathBuf, HashSet<FileId>)> = Vec::new();
        if root_info.is_dir() {
            stack.push((search_root.to_path_buf(), HashSet::from([root_info.id])));
        } else if root_info.id == wanted {
            found.push(search_root.to_path_buf());
        }

        while let Some((dir, ancestors)) = stack.pop() {
            let Ok(entries) = self.read_dir(&dir) else {
                log::debug!("skipping unreadable directory {}", dir.display());
                continue;
            };
            for entry in entries {
                let Ok(info) = self.metadata(&entry) else {
                    continue;
                };
                if info.id == wanted {
                    found.push(entry.clone());
                }
                if info.is_dir() && !ancestors.contains(&info.id) {
                    let mut chain = ancestors.clone();
                    chain.insert(info.id);
                    stack.push((entry, chain));
                }
            }
        }

        found.sort();
        Ok(found)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn read_link(&self, path: &Path) -> Result<Option<PathBuf>> {
        (**self).read_link(path)
    }

    fn metadata(&self, path: &Path) -> Result<FileInfo> {
        (**self).metadata(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        (**self).read_to_string(path)
    }

    fn open_buffered(&self, path: &Path) -> Result<Box<dyn BufRead>> {
        (**self).open_buffered(path)
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        (**self).write_file(path, contents)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        (**self).remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        (**self).remove_dir_all(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (**self).create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        (**self).copy_file(from, to)
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        (**self).symlink(target, link)
    }

    fn set_owner_writable(&self, path: &Path) -> Result<()> {
        (**self).set_owner_writable(path)
    }

    fn find_same_file(&self, search_root: &Path, target: &Path) -> Result<Vec<PathBuf>> {
        (**self).find_same_file(search_root, target)
    }
}

/// Resolves `.` and `..` in an absolute path without touching the
/// filesystem.
///
/// `..` at the root stays at the root.
///
/// # Examples
///
/// ```
/// use bundledeps::fs::lexical_normalize;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     lexical_normalize(Path::new("/opt/homebrew/bin/../Cellar/./qemu")),
///     PathBuf::from("/opt/homebrew/Cellar/qemu")
/// );
/// ```
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if result.parent().is_some() {
                    result.pop();
                }
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}
