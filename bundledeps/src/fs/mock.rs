//! In-memory filesystem for tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::io::{BufRead, Cursor};
use std::path::{Component, Path, PathBuf};

use super::{FileId, FileInfo, FileKind, FileSystem};
use crate::error::{Error, Result};

/// Symlink hops followed before a mock lookup reports a loop.
const MAX_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum Node {
    File { len: u64, contents: String },
    Dir,
    Symlink { target: PathBuf },
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    ino: u64,
}

/// In-memory [`FileSystem`] with real symlink semantics.
///
/// Paths are absolute. Adding an entry creates its missing ancestors as
/// directories. Symlinks may be relative or absolute and are followed the
/// way the kernel follows them, including `..` in targets.
///
/// # Examples
///
/// ```
/// use bundledeps::fs::{FileSystem, MockFileSystem};
/// use std::path::{Path, PathBuf};
///
/// let fs = MockFileSystem::new()
///     .with_file("/r/Cellar/qemu/9.0/bin/qemu-img", 4096)
///     .with_symlink("/r/bin/qemu-img", "../Cellar/qemu/9.0/bin/qemu-img");
///
/// assert_eq!(
///     fs.read_link(Path::new("/r/bin/qemu-img")).unwrap(),
///     Some(PathBuf::from("../Cellar/qemu/9.0/bin/qemu-img"))
/// );
/// assert_eq!(fs.metadata(Path::new("/r/bin/qemu-img")).unwrap().len, 4096);
/// ```
#[derive(Debug)]
pub struct MockFileSystem {
    entries: RefCell<BTreeMap<PathBuf, Entry>>,
    next_ino: Cell<u64>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    /// Creates an empty filesystem containing only `/`.
    #[must_use]
    pub fn new() -> Self {
        let fs = Self {
            entries: RefCell::new(BTreeMap::new()),
            next_ino: Cell::new(1),
        };
        fs.insert(PathBuf::from("/"), Node::Dir);
        fs
    }

    /// Adds a regular file of `len` bytes.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>, len: u64) -> Self {
        self.add_file(path, len);
        self
    }

    /// Adds a regular file with text contents.
    #[must_use]
    pub fn with_file_contents(self, path: impl AsRef<Path>, contents: &str) -> Self {
        self.add_file_contents(path, contents);
        self
    }

    /// Adds a symlink with a literal target.
    #[must_use]
    pub fn with_symlink(self, path: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        self.add_symlink(path, target);
        self
    }

    /// Adds a directory.
    #[must_use]
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.add_dir(path);
        self
    }

    /// Adds a regular file of `len` bytes.
    pub fn add_file(&self, path: impl AsRef<Path>, len: u64) {
        self.add(
            path.as_ref(),
            Node::File {
                len,
                contents: String::new(),
            },
        );
    }

    /// Adds a regular file with text contents.
    pub fn add_file_contents(&self, path: impl AsRef<Path>, contents: &str) {
        self.add(
            path.as_ref(),
            Node::File {
                len: contents.len() as u64,
                contents: contents.to_string(),
            },
        );
    }

    /// Adds a symlink with a literal target.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        self.add(
            path.as_ref(),
            Node::Symlink {
                target: target.as_ref().to_path_buf(),
            },
        );
    }

    /// Adds a directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.add(path.as_ref(), Node::Dir);
    }

    /// Returns `true` if an entry exists at exactly `path` (no symlink
    /// following).
    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.borrow().contains_key(path.as_ref())
    }

    fn add(&self, path: &Path, node: Node) {
        let mut ancestors: Vec<&Path> = path.ancestors().skip(1).collect();
        ancestors.reverse();
        for ancestor in ancestors {
            if !self.entries.borrow().contains_key(ancestor) {
                self.insert(ancestor.to_path_buf(), Node::Dir);
            }
        }
        self.insert(path.to_path_buf(), node);
    }

    fn insert(&self, path: PathBuf, node: Node) {
        let ino = self.next_ino.get();
        self.next_ino.set(ino + 1);
        self.entries.borrow_mut().insert(path, Entry { node, ino });
    }

    /// Maps `path` to the real entry path, following symlinks in every
    /// component and, if `follow_last`, in the final one.
    fn locate(&self, path: &Path, follow_last: bool) -> Result<PathBuf> {
        let mut pending: VecDeque<OsString> = segments(path);
        let mut current = PathBuf::from("/");
        let mut hops = 0;
        let entries = self.entries.borrow();

        while let Some(segment) = pending.pop_front() {
            if segment == ".." {
                current.pop();
                continue;
            }
            let candidate = current.join(&segment);
            match entries.get(&candidate).map(|e| &e.node) {
                None => {
                    return Err(Error::PathNotFound {
                        path: path.to_path_buf(),
                    })
                }
                Some(Node::Symlink { target }) if follow_last || !pending.is_empty() => {
                    hops += 1;
                    if hops > MAX_HOPS {
                        return Err(Error::SymlinkLoop {
                            path: path.to_path_buf(),
                        });
                    }
                    if target.is_absolute() {
                        current = PathBuf::from("/");
                    }
                    for part in segments(target).into_iter().rev() {
                        pending.push_front(part);
                    }
                }
                Some(Node::File { .. }) if !pending.is_empty() => {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: format!("{} is not a directory", candidate.display()),
                    })
                }
                Some(_) => current = candidate,
            }
        }
        Ok(current)
    }

    fn entry(&self, real: &Path) -> Result<Entry> {
        self.entries
            .borrow()
            .get(real)
            .cloned()
            .ok_or_else(|| Error::PathNotFound {
                path: real.to_path_buf(),
            })
    }

    fn require_parent(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "no parent directory".to_string(),
        })?;
        let real = self.locate(parent, true)?;
        match self.entry(&real)?.node {
            Node::Dir => Ok(()),
            _ => Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "parent is not a directory".to_string(),
            }),
        }
    }
}

fn segments(path: &Path) -> VecDeque<OsString> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_os_string()),
            Component::ParentDir => Some(OsString::from("..")),
            _ => None,
        })
        .collect()
}

impl FileSystem for MockFileSystem {
    fn read_link(&self, path: &Path) -> Result<Option<PathBuf>> {
        let real = self.locate(path, false)?;
        match self.entry(&real)?.node {
            Node::Symlink { target } => Ok(Some(target)),
            _ => Ok(None),
        }
    }

    fn metadata(&self, path: &Path) -> Result<FileInfo> {
        let real = self.locate(path, true)?;
        let entry = self.entry(&real)?;
        let (kind, len) = match entry.node {
            Node::File { len, .. } => (FileKind::File, len),
            Node::Dir => (FileKind::Directory, 64),
            Node::Symlink { .. } => (FileKind::Other, 0),
        };
        Ok(FileInfo {
            kind,
            len,
            id: FileId {
                dev: 1,
                ino: entry.ino,
            },
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let real = self.locate(path, true)?;
        if !matches!(self.entry(&real)?.node, Node::Dir) {
            return Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
        let entries = self.entries.borrow();
        let mut children: Vec<PathBuf> = entries
            .keys()
            .filter(|child| child.parent() == Some(real.as_path()))
            .filter_map(|child| child.file_name().map(|name| path.join(name)))
            .collect();
        children.sort();
        Ok(children)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let real = self.locate(path, true)?;
        match self.entry(&real)?.node {
            Node::File { contents, .. } => Ok(contents),
            _ => Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            }),
        }
    }

    fn open_buffered(&self, path: &Path) -> Result<Box<dyn BufRead>> {
        let contents = self.read_to_string(path)?;
        Ok(Box::new(Cursor::new(contents.into_bytes())))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let target = match self.locate(path, true) {
            Ok(real) => {
                if matches!(self.entry(&real)?.node, Node::Dir) {
                    return Err(Error::InvalidPath {
                        path: path.to_path_buf(),
                        reason: "is a directory".to_string(),
                    });
                }
                real
            }
            Err(e) if e.is_not_found() => {
                self.require_parent(path)?;
                path.to_path_buf()
            }
            Err(e) => return Err(e),
        };
        self.insert(
            target,
            Node::File {
                len: contents.len() as u64,
                contents: contents.to_string(),
            },
        );
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let real = self.locate(path, false)?;
        if matches!(self.entry(&real)?.node, Node::Dir) {
            return Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "is a directory".to_string(),
            });
        }
        self.entries.borrow_mut().remove(&real);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let real = match self.locate(path, false) {
            Ok(real) => real,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        self.entries
            .borrow_mut()
            .retain(|key, _| !key.starts_with(&real));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.locate(path, true).is_ok() {
            return Ok(());
        }
        self.add_dir(path);
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let real = self.locate(from, true)?;
        let node = self.entry(&real)?.node;
        if !matches!(node, Node::File { .. }) {
            return Err(Error::InvalidPath {
                path: from.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        self.require_parent(to)?;
        self.insert(to.to_path_buf(), node);
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        self.require_parent(link)?;
        if self.contains(link) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", link.display()),
            )));
        }
        self.insert(
            link.to_path_buf(),
            Node::Symlink {
                target: target.to_path_buf(),
            },
        );
        Ok(())
    }

    fn set_owner_writable(&self, path: &Path) -> Result<()> {
        self.locate(path, true).map(|_| ())
    }
}
