//! Verification of a dependency set against a baseline snapshot.
//!
//! Both sides are grouped by a version-agnostic normalized key. Keys only in
//! the baseline are missing, keys only in the current set are unexpected,
//! and shared keys whose concrete paths differ are version mismatches.
//! Missing or unexpected entries fail verification; mismatches only warn.

pub mod baseline;
pub mod normalize;
pub mod verifier;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use baseline::{load_snapshot, parse_snapshot, render_snapshot, write_snapshot, Snapshot};
pub use normalize::{Normalizer, RewriteRule};
pub use verifier::{VerificationReport, Verifier, VersionMismatch};
