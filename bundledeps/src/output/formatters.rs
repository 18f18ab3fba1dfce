//! Output formatter implementations.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::closure::DependencyRegistry;
use crate::error::Outcome;
use crate::linkage::LinkagePlan;
use crate::observe::TraceEvent;
use crate::operations::CollectResult;
use crate::stage::StageReport;
use crate::verify::VerificationReport;
use crate::Result;

use super::ReportFormatter;

/// Human-readable text.
pub struct TextFormatter;

impl TextFormatter {
    fn write_registry(out: &mut String, registry: &DependencyRegistry) {
        for (path, annotation) in registry {
            let _ = writeln!(out, "{} {annotation}", path.display());
        }
    }

    fn write_verification(out: &mut String, report: &VerificationReport) {
        let _ = writeln!(
            out,
            "Verifying dependencies against {} (ignoring version mismatches)",
            report.baseline.display()
        );
        let _ = writeln!(out, "Expected dependencies: {}", report.expected.len());
        let _ = writeln!(out, "Current dependencies: {}", report.current.len());

        if !report.passed() {
            let _ = writeln!(out, "--- Expected Dependencies ---");
            for (path, description) in &report.expected {
                let _ = writeln!(out, "  {} {description}", path.display());
            }
            let _ = writeln!(out, "--- Current Dependencies ---");
            for (path, description) in &report.current {
                let _ = writeln!(out, "  {} {description}", path.display());
            }
        }

        if !report.missing.is_empty() {
            let _ = writeln!(out, "Missing expected dependencies:");
            for path in &report.missing {
                let _ = writeln!(out, "  - {}", path.display());
            }
        }
        if !report.unexpected.is_empty() {
            let _ = writeln!(out, "Unexpected dependencies:");
            for path in &report.unexpected {
                let description = report.current.get(path).map_or("", String::as_str);
                let _ = writeln!(out, "  + {} {description}", path.display());
            }
        }
        if !report.version_mismatches.is_empty() {
            let _ = writeln!(out, "Version mismatches (not failing verification):");
            for mismatch in &report.version_mismatches {
                let _ = writeln!(out, "  ~ Expected: {}", mismatch.expected.display());
                let _ = writeln!(out, "    Current:  {}", mismatch.current.display());
            }
        }

        let verdict = if report.passed() { "PASSED" } else { "FAILED" };
        let _ = writeln!(out, "Dependency verification {verdict}");
    }
}

impl ReportFormatter for TextFormatter {
    fn registry(&self, registry: &DependencyRegistry) -> Result<String> {
        let mut out = String::new();
        Self::write_registry(&mut out, registry);
        Ok(out)
    }

    fn verification(&self, report: &VerificationReport) -> Result<String> {
        let mut out = String::new();
        Self::write_verification(&mut out, report);
        Ok(out)
    }

    fn collect(&self, result: &CollectResult) -> Result<String> {
        let mut out = String::new();

        if result.dry_run {
            let _ = writeln!(out, "Dry run, would perform:");
            for action in &result.actions_taken {
                let _ = writeln!(out, "  {action}");
            }
            for warning in &result.warnings {
                let _ = writeln!(out, "  warning: {warning}");
            }
            return Ok(out);
        }

        Self::write_registry(&mut out, &result.registry);
        let _ = writeln!(out, "{} dependencies", result.registry.len());

        match &result.ingest {
            Some(Outcome::Completed(stats)) => {
                let _ = writeln!(
                    out,
                    "Runtime discovery: {} file accesses, {} new dependencies",
                    stats.observed, stats.new_deps
                );
            }
            Some(Outcome::Skipped { reason }) => {
                let _ = writeln!(out, "Runtime discovery skipped: {reason}");
            }
            None => {}
        }

        match &result.verification {
            Some(Outcome::Completed(report)) => Self::write_verification(&mut out, report),
            Some(Outcome::Skipped { reason }) => {
                let _ = writeln!(out, "Verification skipped: {reason}");
            }
            None => {}
        }
        Ok(out)
    }

    fn trace_events(&self, events: &[TraceEvent]) -> Result<String> {
        let mut out = String::new();
        for event in events {
            let _ = writeln!(
                out,
                "{:>6}  {:<4}  {}",
                event.line,
                event.operation,
                event.path.display()
            );
        }
        Ok(out)
    }

    fn normalized(&self, keys: &[(PathBuf, String)]) -> Result<String> {
        let mut out = String::new();
        for (path, key) in keys {
            let _ = writeln!(out, "{} -> {key}", path.display());
        }
        Ok(out)
    }

    fn stage(&self, report: &StageReport, plan: &LinkagePlan) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Staged {} entries into {}",
            report.entries.len(),
            report.dest_root.display()
        );
        for entry in &plan.entries {
            let _ = writeln!(
                out,
                "{}: {} rewrites{}",
                entry.dest.display(),
                entry.rewrites.len(),
                if entry.resign { ", re-sign" } else { "" }
            );
            for rewrite in &entry.rewrites {
                let _ = writeln!(out, "  {} -> {}", rewrite.from, rewrite.to);
            }
        }
        for skipped in &plan.skipped {
            let _ = writeln!(out, "skipped {}: {}", skipped.path.display(), skipped.reason);
        }
        Ok(out)
    }
}

/// Pretty-printed JSON.
pub struct JsonFormatter;

#[derive(Serialize)]
struct NormalizedKey<'a> {
    path: &'a PathBuf,
    key: &'a str,
}

#[derive(Serialize)]
struct StageOutput<'a> {
    staged: &'a StageReport,
    linkage: &'a LinkagePlan,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

impl ReportFormatter for JsonFormatter {
    fn registry(&self, registry: &DependencyRegistry) -> Result<String> {
        to_json(registry)
    }

    fn verification(&self, report: &VerificationReport) -> Result<String> {
        to_json(report)
    }

    fn collect(&self, result: &CollectResult) -> Result<String> {
        to_json(result)
    }

    fn trace_events(&self, events: &[TraceEvent]) -> Result<String> {
        to_json(events)
    }

    fn normalized(&self, keys: &[(PathBuf, String)]) -> Result<String> {
        let entries: Vec<NormalizedKey<'_>> = keys
            .iter()
            .map(|(path, key)| NormalizedKey { path, key })
            .collect();
        to_json(&entries)
    }

    fn stage(&self, report: &StageReport, plan: &LinkagePlan) -> Result<String> {
        to_json(&StageOutput {
            staged: report,
            linkage: plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::Annotation;
    use crate::verify::{Snapshot, VersionMismatch};

    fn registry() -> DependencyRegistry {
        let mut registry = DependencyRegistry::new();
        registry.insert(
            "/r/opt/glib".into(),
            Annotation::SymlinkTo("../Cellar/glib/2.80".into()),
        );
        registry.insert(
            "/r/Cellar/glib/2.80/lib/libglib-2.0.0.dylib".into(),
            Annotation::RealFile("1.0M".into()),
        );
        registry
    }

    fn failing_report() -> VerificationReport {
        let mut current = Snapshot::new();
        current.insert("/r/lib/libnew.dylib".into(), "[4K]".into());
        VerificationReport {
            baseline: "/b/deps.txt".into(),
            expected: Snapshot::new(),
            current,
            missing: vec!["/r/lib/libgone.dylib".into()],
            unexpected: vec!["/r/lib/libnew.dylib".into()],
            version_mismatches: vec![VersionMismatch {
                expected: "/r/opt/glib@2.78".into(),
                current: "/r/opt/glib@2.80".into(),
            }],
        }
    }

    #[test]
    fn test_text_registry() {
        let text = TextFormatter.registry(&registry()).unwrap();
        assert_eq!(
            text,
            "/r/Cellar/glib/2.80/lib/libglib-2.0.0.dylib [1.0M]\n/r/opt/glib → ../Cellar/glib/2.80\n"
        );
    }

    #[test]
    fn test_text_verification_markers() {
        let text = TextFormatter.verification(&failing_report()).unwrap();
        assert!(text.contains("  - /r/lib/libgone.dylib\n"));
        assert!(text.contains("  + /r/lib/libnew.dylib [4K]\n"));
        assert!(text.contains("  ~ Expected: /r/opt/glib@2.78\n"));
        assert!(text.ends_with("Dependency verification FAILED\n"));
    }

    #[test]
    fn test_json_registry_is_an_object() {
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter.registry(&registry()).unwrap()).unwrap();
        assert!(json.is_object());
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_json_normalized() {
        let keys = vec![(
            PathBuf::from("/r/Cellar/glib/2.80/lib/libglib-2.0.0.dylib"),
            "/r/Cellar/glib/*/lib/libglib-2.0.*.dylib".to_string(),
        )];
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter.normalized(&keys).unwrap()).unwrap();
        assert_eq!(json[0]["key"], "/r/Cellar/glib/*/lib/libglib-2.0.*.dylib");
    }
}
