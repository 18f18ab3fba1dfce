//! Comparison of the registry against a baseline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::baseline::{load_snapshot, Snapshot};
use super::normalize::Normalizer;
use crate::closure::DependencyRegistry;
use crate::error::{Error, Outcome, Result};
use crate::fs::FileSystem;

/// An expected path whose normalized key is present but which is not itself
/// a current key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionMismatch {
    /// The baseline path.
    pub expected: PathBuf,
    /// The first current path sharing its normalized key.
    pub current: PathBuf,
}

/// Result of comparing a current set against a baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// The baseline the comparison was made against.
    pub baseline: PathBuf,
    /// Baseline entries.
    pub expected: Snapshot,
    /// Current entries.
    pub current: Snapshot,
    /// Expected paths whose normalized key is absent from the current set.
    pub missing: Vec<PathBuf>,
    /// Current paths whose normalized key is absent from the baseline.
    pub unexpected: Vec<PathBuf>,
    /// Version drift; never fatal.
    pub version_mismatches: Vec<VersionMismatch>,
}

impl VerificationReport {
    /// Returns `true` when nothing is missing or unexpected.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// Converts a failed report into [`Error::VerificationFailed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the report did not pass.
    pub fn ensure_passed(&self) -> Result<()> {
        if self.passed() {
            Ok(())
        } else {
            Err(Error::VerificationFailed {
                missing: self.missing.len(),
                unexpected: self.unexpected.len(),
                baseline: self.baseline.clone(),
            })
        }
    }
}

/// Compares dependency sets modulo version numbers.
///
/// # Examples
///
/// ```
/// use bundledeps::verify::{Snapshot, Verifier};
/// use std::path::Path;
///
/// let verifier = Verifier::for_root(Path::new("/root")).unwrap();
/// let expected = Snapshot::from([("/root/opt/foo@3".into(), String::new())]);
/// let current = Snapshot::from([("/root/opt/foo@4".into(), String::new())]);
///
/// let report = verifier.compare(Path::new("baseline.txt"), &expected, &current);
/// assert!(report.passed());
/// assert_eq!(report.version_mismatches.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Verifier {
    normalizer: Normalizer,
}

impl Verifier {
    /// Creates a verifier with explicit normalization rules.
    #[must_use]
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Creates a verifier with the standard rules for `root`.
    ///
    /// # Errors
    ///
    /// Returns an error only if a rule fails to compile.
    pub fn for_root(root: &Path) -> Result<Self> {
        Normalizer::for_root(root).map(Self::new)
    }

    /// The normalizer in use.
    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Compares two snapshots.
    #[must_use]
    pub fn compare(&self, baseline: &Path, expected: &Snapshot, current: &Snapshot) -> VerificationReport {
        let expected_keys = self.group(expected);
        let current_keys = self.group(current);

        let mut missing = Vec::new();
        let mut version_mismatches = Vec::new();
        for (key, expected_paths) in &expected_keys {
            let Some(current_paths) = current_keys.get(key) else {
                missing.extend(expected_paths.iter().cloned());
                continue;
            };
            for expected_path in expected_paths {
                if !current.contains_key(expected_path) {
                    version_mismatches.push(VersionMismatch {
                        expected: expected_path.clone(),
                        current: current_paths[0].clone(),
                    });
                }
            }
        }

        let unexpected = current_keys
            .iter()
            .filter(|(key, _)| !expected_keys.contains_key(*key))
            .flat_map(|(_, paths)| paths.iter().cloned())
            .collect();

        VerificationReport {
            baseline: baseline.to_path_buf(),
            expected: expected.clone(),
            current: current.clone(),
            missing,
            unexpected,
            version_mismatches,
        }
    }

    /// Verifies `registry` against the baseline file at `baseline`.
    ///
    /// A missing baseline skips verification. Version mismatches are logged
    /// as warnings; a report with missing or unexpected entries is returned
    /// as-is for the caller to render before calling
    /// [`VerificationReport::ensure_passed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the baseline exists but cannot be read or parsed.
    pub fn verify<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        baseline: &Path,
        registry: &DependencyRegistry,
    ) -> Result<Outcome<VerificationReport>> {
        let expected = match load_snapshot(fs, baseline)? {
            Outcome::Completed(snapshot) => snapshot,
            Outcome::Skipped { reason } => {
                log::warn!("{reason}; skipping dependency verification");
                return Ok(Outcome::Skipped { reason });
            }
        };
        log::info!(
            "verifying {} dependencies against {} baseline entries",
            registry.len(),
            expected.len()
        );

        let report = self.compare(baseline, &expected, &registry.to_snapshot());
        for mismatch in &report.version_mismatches {
            log::warn!(
                "version mismatch: expected {}, found {}",
                mismatch.expected.display(),
                mismatch.current.display()
            );
        }
        Ok(Outcome::Completed(report))
    }

    fn group(&self, snapshot: &Snapshot) -> BTreeMap<String, Vec<PathBuf>> {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for path in snapshot.keys() {
            groups
                .entry(self.normalizer.normalize(path))
                .or_default()
                .push(path.clone());
        }
        groups
    }
}
