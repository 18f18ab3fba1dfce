//! The dependency registry.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::verify::Snapshot;

/// What a registry key is.
///
/// # Examples
///
/// ```
/// use bundledeps::Annotation;
/// use std::path::PathBuf;
///
/// let link = Annotation::SymlinkTo(PathBuf::from("../Cellar/qemu/9.0.2"));
/// assert_eq!(link.to_string(), "→ ../Cellar/qemu/9.0.2");
///
/// let file = Annotation::RealFile("12K".to_string());
/// assert_eq!(file.to_string(), "[12K]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// A symlink, with its literal `readlink` target.
    SymlinkTo(PathBuf),
    /// A real file, with its human-readable size.
    RealFile(String),
}

impl Annotation {
    /// Parses a snapshot description back into an annotation.
    ///
    /// Returns `None` for bare or free-form descriptions.
    #[must_use]
    pub fn parse_description(description: &str) -> Option<Self> {
        let description = description.trim();
        if let Some(target) = description.strip_prefix('→') {
            let target = target.trim();
            return (!target.is_empty()).then(|| Self::SymlinkTo(PathBuf::from(target)));
        }
        description
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .map(|size| Self::RealFile(size.to_string()))
    }

    /// Returns `true` for symlink entries.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::SymlinkTo(_))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymlinkTo(target) => write!(f, "→ {}", target.display()),
            Self::RealFile(size) => write!(f, "[{size}]"),
        }
    }
}

/// Absolute path → [`Annotation`] for every artifact in the closure.
///
/// Inserts are idempotent and never overwrite; iteration is in sorted key
/// order.
///
/// # Examples
///
/// ```
/// use bundledeps::{Annotation, DependencyRegistry};
/// use std::path::PathBuf;
///
/// let mut registry = DependencyRegistry::new();
/// let path = PathBuf::from("/opt/homebrew/Cellar/qemu/9.0.2/bin/qemu-img");
///
/// assert!(registry.insert(path.clone(), Annotation::RealFile("2.1M".into())));
/// assert!(!registry.insert(path.clone(), Annotation::RealFile("0B".into())));
/// assert_eq!(registry.get(&path), Some(&Annotation::RealFile("2.1M".into())));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyRegistry {
    entries: BTreeMap<PathBuf, Annotation>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` unless it is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn insert(&mut self, path: PathBuf, annotation: Annotation) -> bool {
        if self.entries.contains_key(&path) {
            return false;
        }
        log::debug!("recorded {} {annotation}", path.display());
        self.entries.insert(path, annotation);
        true
    }

    /// Returns `true` if `path` is a key.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Looks up the annotation for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Annotation> {
        self.entries.get(path)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Annotation)> {
        self.entries.iter()
    }

    /// Iterates keys in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    /// Projects the registry to a snapshot whose descriptions are the
    /// annotation display strings.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        self.entries
            .iter()
            .map(|(path, annotation)| (path.clone(), annotation.to_string()))
            .collect()
    }

    /// Rebuilds a registry from a snapshot written by [`Self::to_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns an error if a description is neither `→ <target>` nor
    /// `[<size>]`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let mut registry = Self::new();
        for (path, description) in snapshot {
            let annotation =
                Annotation::parse_description(description).ok_or_else(|| Error::InvalidPath {
                    path: path.clone(),
                    reason: format!(
                        "registry entry has no symlink target or size (found '{description}')"
                    ),
                })?;
            registry.insert(path.clone(), annotation);
        }
        Ok(registry)
    }
}

impl<'a> IntoIterator for &'a DependencyRegistry {
    type Item = (&'a PathBuf, &'a Annotation);
    type IntoIter = std::collections::btree_map::Iter<'a, PathBuf, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description() {
        assert_eq!(
            Annotation::parse_description("→ ../Cellar/qemu/9.0.2"),
            Some(Annotation::SymlinkTo(PathBuf::from("../Cellar/qemu/9.0.2")))
        );
        assert_eq!(
            Annotation::parse_description("[1.5M]"),
            Some(Annotation::RealFile("1.5M".into()))
        );
        assert_eq!(Annotation::parse_description(""), None);
        assert_eq!(Annotation::parse_description("→"), None);
        assert_eq!(Annotation::parse_description("something"), None);
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut registry = DependencyRegistry::new();
        let path = PathBuf::from("/r/lib/libz.dylib");
        assert!(registry.insert(path.clone(), Annotation::SymlinkTo("libz.1.dylib".into())));
        assert!(!registry.insert(path.clone(), Annotation::RealFile("1K".into())));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&path).unwrap().is_symlink());
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut registry = DependencyRegistry::new();
        registry.insert("/r/b".into(), Annotation::RealFile("1K".into()));
        registry.insert("/r/a".into(), Annotation::RealFile("1K".into()));
        registry.insert("/r/c".into(), Annotation::RealFile("1K".into()));

        let keys: Vec<_> = registry.paths().cloned().collect();
        assert_eq!(
            keys,
            vec![
                PathBuf::from("/r/a"),
                PathBuf::from("/r/b"),
                PathBuf::from("/r/c")
            ]
        );
    }

    #[test]
    fn test_snapshot_projection() {
        let mut registry = DependencyRegistry::new();
        registry.insert("/r/opt/qemu".into(), Annotation::SymlinkTo("../Cellar/qemu/9.0.2".into()));
        registry.insert("/r/Cellar/qemu/9.0.2/bin/qemu-img".into(), Annotation::RealFile("2.0M".into()));

        let snapshot = registry.to_snapshot();
        assert_eq!(
            snapshot.get(Path::new("/r/opt/qemu")).map(String::as_str),
            Some("→ ../Cellar/qemu/9.0.2")
        );
        assert_eq!(DependencyRegistry::from_snapshot(&snapshot).unwrap(), registry);
    }

    #[test]
    fn test_from_snapshot_rejects_bare_entries() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("/r/lib/libz.dylib".into(), String::new());
        assert!(DependencyRegistry::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn test_json_shape() {
        let mut registry = DependencyRegistry::new();
        registry.insert("/r/a".into(), Annotation::RealFile("1K".into()));
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["/r/a"]["real_file"], "1K");
    }
}
