//! Baseline snapshot files.
//!
//! One dependency per line: an absolute path, optionally followed by
//! whitespace and a free-form description (`→ <target>` or `[<size>]` when
//! written by this crate). Blank lines and lines starting with `#` are
//! ignored.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Outcome, Result};
use crate::fs::FileSystem;

/// Path → description.
pub type Snapshot = BTreeMap<PathBuf, String>;

/// Parses snapshot text.
///
/// # Errors
///
/// Returns [`Error::MalformedSnapshot`] for a path that is not absolute.
///
/// # Examples
///
/// ```
/// use bundledeps::verify::parse_snapshot;
/// use std::path::Path;
///
/// let snapshot = parse_snapshot("# header\n\n/r/opt/qemu → ../Cellar/qemu/9.0.2\n/r/bin/tool\n").unwrap();
/// assert_eq!(snapshot.len(), 2);
/// assert_eq!(snapshot[Path::new("/r/opt/qemu")], "→ ../Cellar/qemu/9.0.2");
/// assert_eq!(snapshot[Path::new("/r/bin/tool")], "");
/// ```
pub fn parse_snapshot(text: &str) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (path, description) = match line.split_once(char::is_whitespace) {
            Some((path, rest)) => (path, rest.trim()),
            None => (line, ""),
        };
        let path = PathBuf::from(path);
        if !path.is_absolute() {
            return Err(Error::MalformedSnapshot {
                line: index + 1,
                reason: format!("{} is not an absolute path", path.display()),
            });
        }
        snapshot.insert(path, description.to_string());
    }
    Ok(snapshot)
}

/// Loads a snapshot file, skipping when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_snapshot<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Outcome<Snapshot>> {
    let text = match fs.read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.is_not_found() => {
            return Ok(Outcome::skipped(format!(
                "baseline {} not found",
                path.display()
            )))
        }
        Err(e) => return Err(e),
    };
    parse_snapshot(&text).map(Outcome::Completed)
}

/// Renders a snapshot in the baseline format with a timestamp header.
#[must_use]
pub fn render_snapshot(snapshot: &Snapshot, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# bundledeps dependency snapshot");
    let _ = writeln!(out, "# generated {}", generated_at.to_rfc3339());
    for (path, description) in snapshot {
        if description.is_empty() {
            let _ = writeln!(out, "{}", path.display());
        } else {
            let _ = writeln!(out, "{} {description}", path.display());
        }
    }
    out
}

/// Writes a snapshot file stamped with the current local time.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_snapshot<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    snapshot: &Snapshot,
) -> Result<()> {
    fs.write_file(path, &render_snapshot(snapshot, Local::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use chrono::TimeZone;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let snapshot = parse_snapshot("\n# comment\n   \n  /r/a   [1K]  \n").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[Path::new("/r/a")], "[1K]");
    }

    #[test]
    fn test_parse_tab_separator() {
        let snapshot = parse_snapshot("/r/a\t→ b\n").unwrap();
        assert_eq!(snapshot[Path::new("/r/a")], "→ b");
    }

    #[test]
    fn test_parse_rejects_relative_paths() {
        let err = parse_snapshot("/r/a\nrelative/b [1K]\n").unwrap_err();
        match err {
            Error::MalformedSnapshot { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_is_skipped() {
        let fs = MockFileSystem::new();
        let outcome = load_snapshot(&fs, Path::new("/deps.txt")).unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_load_present() {
        let fs = MockFileSystem::new().with_file_contents("/deps.txt", "/r/a [1K]\n");
        let snapshot = load_snapshot(&fs, Path::new("/deps.txt"))
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_render_then_parse() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("/r/b".into(), "[2.0M]".into());
        snapshot.insert("/r/a".into(), "→ b".into());
        snapshot.insert("/r/c".into(), String::new());

        let stamp = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let text = render_snapshot(&snapshot, stamp);

        assert!(text.starts_with("# bundledeps dependency snapshot\n# generated 2024-05-01T12:00:00"));
        assert!(text.contains("\n/r/a → b\n/r/b [2.0M]\n/r/c\n"));
        assert_eq!(parse_snapshot(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_write_snapshot_replaces_the_baseline() {
        let fs = MockFileSystem::new().with_file_contents("/baselines/deps.txt", "/r/stale\n");
        let mut snapshot = Snapshot::new();
        snapshot.insert("/r/a".into(), "[1K]".into());

        write_snapshot(&fs, Path::new("/baselines/deps.txt"), &snapshot).unwrap();

        let loaded = load_snapshot(&fs, Path::new("/baselines/deps.txt"))
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_write_snapshot_needs_an_existing_directory() {
        let fs = MockFileSystem::new();
        let err = write_snapshot(&fs, Path::new("/missing/deps.txt"), &Snapshot::new())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_write_snapshot_on_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deps.txt");
        let mut snapshot = Snapshot::new();
        snapshot.insert("/r/a".into(), "[1K]".into());

        write_snapshot(&crate::fs::HostFileSystem, &path, &snapshot).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_snapshot(&text).unwrap(), snapshot);
    }
}
