//! Report formatting.
//!
//! Every command result can be rendered as human-readable text or as JSON.

mod formatters;

use std::path::PathBuf;

use crate::closure::DependencyRegistry;
use crate::linkage::LinkagePlan;
use crate::observe::TraceEvent;
use crate::operations::CollectResult;
use crate::stage::StageReport;
use crate::verify::VerificationReport;
use crate::Result;

pub use formatters::{JsonFormatter, TextFormatter};

/// Renders command results.
pub trait ReportFormatter {
    /// Formats a registry, one entry per line in text form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn registry(&self, registry: &DependencyRegistry) -> Result<String>;

    /// Formats a verification report.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn verification(&self, report: &VerificationReport) -> Result<String>;

    /// Formats a collection run.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn collect(&self, result: &CollectResult) -> Result<String>;

    /// Formats parsed trace events.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn trace_events(&self, events: &[TraceEvent]) -> Result<String>;

    /// Formats paths with their normalized keys.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn normalized(&self, keys: &[(PathBuf, String)]) -> Result<String>;

    /// Formats a staging run and its linkage plan.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn stage(&self, report: &StageReport, plan: &LinkagePlan) -> Result<String>;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Create a formatter for this output format.
    #[must_use]
    pub fn create_formatter(self) -> Box<dyn ReportFormatter> {
        match self {
            Self::Text => Box::new(TextFormatter),
            Self::Json => Box::new(JsonFormatter),
        }
    }
}
