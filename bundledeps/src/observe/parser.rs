//! Trace log parsing.

use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::Result;

/// File operation reported by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOperation {
    /// An `open` event.
    Open,
    /// A `read` event.
    Read,
}

impl fmt::Display for TraceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// One qualifying trace line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// 1-based line number in the log.
    pub line: usize,
    /// The reported operation.
    pub operation: TraceOperation,
    /// Absolute path under the installation root.
    pub path: PathBuf,
}

/// Extracts `open`/`read` events under the installation root.
///
/// Paths reported as `../<rest>` are re-anchored as `<root>/<rest>`.
///
/// # Examples
///
/// ```
/// use bundledeps::observe::TraceLogParser;
/// use std::path::{Path, PathBuf};
///
/// let parser = TraceLogParser::new(Path::new("/opt/homebrew")).unwrap();
/// let line = "10:00:01.1  open  F=5 (R_____)  /opt/homebrew/lib/libz.1.dylib  0.000010   qemu-img.77";
/// let (_, path) = parser.parse_line(line).unwrap();
/// assert_eq!(path, PathBuf::from("/opt/homebrew/lib/libz.1.dylib"));
/// ```
#[derive(Debug, Clone)]
pub struct TraceLogParser {
    root: PathBuf,
    pattern: Regex,
}

impl TraceLogParser {
    /// Creates a parser for `root`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the line pattern fails to compile.
    pub fn new(root: &Path) -> Result<Self> {
        let escaped = regex::escape(&root.to_string_lossy());
        let pattern = Regex::new(&format!(
            r"\s+(open|read)\s+.*?\s+({escaped}/\S+|\.\./\S+?)(?:\s+\d+\.\d+\s+\S+)?$"
        ))?;
        Ok(Self {
            root: root.to_path_buf(),
            pattern,
        })
    }

    /// Parses one line, returning the operation and absolute path.
    #[must_use]
    pub fn parse_line(&self, line: &str) -> Option<(TraceOperation, PathBuf)> {
        let captures = self.pattern.captures(line.trim())?;
        let operation = match &captures[1] {
            "open" => TraceOperation::Open,
            _ => TraceOperation::Read,
        };
        let raw = &captures[2];
        let path = match raw.strip_prefix("../") {
            Some(rest) => self.root.join(rest),
            None => PathBuf::from(raw),
        };
        Some((operation, path))
    }

    /// Parses a whole log held in memory.
    #[must_use]
    pub fn parse(&self, text: &str) -> Vec<TraceEvent> {
        self.events(text.as_bytes()).filter_map(Result::ok).collect()
    }

    /// Streams the qualifying events of a log one line at a time.
    ///
    /// Lines that are not valid UTF-8 are decoded lossily.
    pub fn events<B: BufRead>(&self, reader: B) -> TraceEvents<'_, B> {
        TraceEvents {
            parser: self,
            reader,
            buf: Vec::new(),
            line: 0,
        }
    }
}

/// Iterator returned by [`TraceLogParser::events`].
#[derive(Debug)]
pub struct TraceEvents<'p, B> {
    parser: &'p TraceLogParser,
    reader: B,
    buf: Vec<u8>,
    line: usize,
}

impl<B: BufRead> Iterator for TraceEvents<'_, B> {
    type Item = Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let text = String::from_utf8_lossy(&self.buf);
                    if let Some((operation, path)) = self.parser.parse_line(&text) {
                        return Some(Ok(TraceEvent {
                            line: self.line,
                            operation,
                            path,
                        }));
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
