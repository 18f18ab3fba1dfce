//! Runtime discovery of dependencies.
//!
//! A background tracer records file accesses while VM templates boot and
//! shut down. Afterwards the log is parsed and every traced file, plus every
//! symlink under `<root>/opt` reaching the same file, is resolved into the
//! registry. Runtime discovery is best-effort: a missing log or failed
//! alias search only warns.

pub mod observer;
pub mod parser;
pub mod templates;
pub mod trace;

pub use observer::{IngestStats, RuntimeObserver};
pub use parser::{TraceEvent, TraceEvents, TraceLogParser, TraceOperation};
pub use templates::{TemplateRunner, DEFAULT_TEMPLATES};
pub use trace::{TraceConfig, TraceSession};
