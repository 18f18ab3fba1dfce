//! Native filesystem implementation.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{FileId, FileInfo, FileKind, FileSystem};
use crate::error::{Error, Result};

/// [`FileSystem`] backed by the host's real filesystem.
///
/// # Examples
///
/// ```no_run
/// use bundledeps::fs::{FileSystem, HostFileSystem};
/// use std::path::Path;
///
/// let fs = HostFileSystem;
/// let target = fs.read_link(Path::new("/opt/homebrew/bin/limactl")).unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFileSystem;

impl FileSystem for HostFileSystem {
    fn read_link(&self, path: &Path) -> Result<Option<PathBuf>> {
        let meta = fs::symlink_metadata(path).map_err(|e| Error::from_io(path, e))?;
        if !meta.file_type().is_symlink() {
            return Ok(None);
        }
        fs::read_link(path)
            .map(Some)
            .map_err(|e| Error::from_io(path, e))
    }

    fn metadata(&self, path: &Path) -> Result<FileInfo> {
        let meta = fs::metadata(path).map_err(|e| Error::from_io(path, e))?;
        let kind = if meta.is_file() {
            FileKind::File
        } else if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        };
        Ok(FileInfo {
            kind,
            len: meta.len(),
            id: file_id(&meta),
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)
            .map_err(|e| Error::from_io(path, e))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| Error::from_io(path, e))?;
        entries.sort();
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::from_io(path, e))
    }

    fn open_buffered(&self, path: &Path) -> Result<Box<dyn BufRead>> {
        let file = fs::File::open(path).map_err(|e| Error::from_io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|e| Error::from_io(path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::from_io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::from_io(path, e)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| Error::from_io(path, e))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| Error::from_io(from, e))
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, link).map_err(|e| Error::from_io(link, e))
        }
        #[cfg(not(unix))]
        {
            Err(Error::Environment {
                reason: format!(
                    "cannot create symlink {} -> {}: symlinks require a Unix host",
                    link.display(),
                    target.display()
                ),
            })
        }
    }

    fn set_owner_writable(&self, path: &Path) -> Result<()> {
        let meta = fs::metadata(path).map_err(|e| Error::from_io(path, e))?;
        let mut permissions = meta.permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            permissions.set_mode(permissions.mode() | 0o200);
        }
        #[cfg(not(unix))]
        {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
        }
        fs::set_permissions(path, permissions).map_err(|e| Error::from_io(path, e))
    }
}

#[cfg(unix)]
fn file_id(meta: &fs::Metadata) -> FileId {
    use std::os::unix::fs::MetadataExt;
    FileId {
        dev: meta.dev(),
        ino: meta.ino(),
    }
}

#[cfg(not(unix))]
fn file_id(_meta: &fs::Metadata) -> FileId {
    FileId { dev: 0, ino: 0 }
}
