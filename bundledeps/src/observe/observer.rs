//! Merging traced file accesses into the registry.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::parser::TraceLogParser;
use crate::closure::ClosureResolver;
use crate::error::{Outcome, Result};
use crate::fs::FileSystem;

/// Counters reported by [`RuntimeObserver::ingest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Qualifying events naming a regular file.
    pub observed: usize,
    /// Paths handed to the resolver (traced files plus their aliases).
    pub new_deps: usize,
}

/// Resolves traced paths and their aliases into the registry.
///
/// # Examples
///
/// ```
/// use bundledeps::fs::MockFileSystem;
/// use bundledeps::observe::RuntimeObserver;
/// use bundledeps::ClosureResolver;
/// use std::path::Path;
///
/// let fs = MockFileSystem::new()
///     .with_file("/r/Cellar/pixman/0.42/lib/libpixman-1.0.dylib", 600 * 1024)
///     .with_symlink("/r/opt/pixman", "../Cellar/pixman/0.42")
///     .with_file_contents(
///         "/tmp/trace.log",
///         "10:00:00.1  open  F=3  /r/Cellar/pixman/0.42/lib/libpixman-1.0.dylib  0.000010  qemu-img.5\n",
///     );
///
/// let mut resolver = ClosureResolver::new(&fs, "/r");
/// let observer = RuntimeObserver::new(Path::new("/r")).unwrap();
/// let stats = observer.ingest(&mut resolver, Path::new("/tmp/trace.log")).unwrap().completed().unwrap();
///
/// assert_eq!(stats.observed, 1);
/// assert!(resolver.registry().contains(Path::new("/r/opt/pixman")));
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeObserver {
    parser: TraceLogParser,
    alias_dir: PathBuf,
}

impl RuntimeObserver {
    /// Creates an observer searching `<root>/opt` for aliases.
    ///
    /// # Errors
    ///
    /// Returns an error only if the trace pattern fails to compile.
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            parser: TraceLogParser::new(root)?,
            alias_dir: root.join("opt"),
        })
    }

    /// Searches `dir` for aliases instead of `<root>/opt`.
    #[must_use]
    pub fn with_alias_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.alias_dir = dir.into();
        self
    }

    /// The parser in use.
    #[must_use]
    pub fn parser(&self) -> &TraceLogParser {
        &self.parser
    }

    /// Streams the trace log at `log` line by line, resolves every new
    /// dependency, and deletes the log.
    ///
    /// A missing log is skipped. The log is removed whether or not
    /// resolution succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or resolving a traced path
    /// fails fatally.
    pub fn ingest<F: FileSystem>(
        &self,
        resolver: &mut ClosureResolver<F>,
        log: &Path,
    ) -> Result<Outcome<IngestStats>> {
        let reader = match resolver.fs().open_buffered(log) {
            Ok(reader) => reader,
            Err(e) if e.is_not_found() => {
                log::warn!("trace log {} not found, skipping runtime discovery", log.display());
                return Ok(Outcome::skipped(format!(
                    "trace log {} not found",
                    log.display()
                )));
            }
            Err(e) => return Err(e),
        };

        let result = self.ingest_reader(resolver, reader);
        if let Err(e) = resolver.fs().remove_file(log) {
            log::warn!("failed to remove trace log {}: {e}", log.display());
        }

        let stats = result?;
        log::info!(
            "trace: {} qualifying file accesses, {} new dependencies",
            stats.observed,
            stats.new_deps
        );
        Ok(Outcome::Completed(stats))
    }

    /// Resolves the events of an already-read log.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving a traced path fails fatally.
    pub fn ingest_text<F: FileSystem>(
        &self,
        resolver: &mut ClosureResolver<F>,
        text: &str,
    ) -> Result<IngestStats> {
        self.ingest_reader(resolver, text.as_bytes())
    }

    /// Resolves the events of a log as they are read from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or resolving a traced path
    /// fails fatally.
    pub fn ingest_reader<F: FileSystem, B: BufRead>(
        &self,
        resolver: &mut ClosureResolver<F>,
        reader: B,
    ) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        for event in self.parser.events(reader) {
            let event = event?;
            if !resolver.fs().is_file(&event.path) {
                continue;
            }
            stats.observed += 1;
            if resolver.registry().contains(&event.path) {
                continue;
            }

            log::debug!("trace line {}: {} {}", event.line, event.operation, event.path.display());
            resolver.resolve(&event.path)?;
            stats.new_deps += 1;

            let aliases = match resolver.fs().find_same_file(&self.alias_dir, &event.path) {
                Ok(aliases) => aliases,
                Err(e) => {
                    log::warn!("alias search for {} failed: {e}", event.path.display());
                    continue;
                }
            };
            for alias in aliases {
                if alias == event.path || resolver.registry().contains(&alias) {
                    continue;
                }
                resolver.resolve(&alias)?;
                stats.new_deps += 1;
            }
        }

        Ok(stats)
    }
}
