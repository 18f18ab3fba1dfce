//! Property-based tests for normalization and comparison.

use super::{Normalizer, Snapshot, Verifier};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,10}"
}

fn version_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(0u32..100, 1..4).prop_map(|parts| {
        parts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    })
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (name_strategy(), version_strategy())
            .prop_map(|(name, version)| format!("/root/opt/{name}@{version}")),
        (name_strategy(), version_strategy(), name_strategy())
            .prop_map(|(pkg, version, file)| format!("/root/Cellar/{pkg}/{version}/lib/{file}")),
        (name_strategy(), version_strategy())
            .prop_map(|(name, version)| format!("/root/lib/lib{name}.{version}.dylib")),
        prop::collection::vec(name_strategy(), 1..5)
            .prop_map(|parts| format!("/root/{}", parts.join("/"))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // normalize(normalize(p)) == normalize(p)
    #[test]
    fn normalization_is_idempotent(path in path_strategy()) {
        let normalizer = Normalizer::for_root(Path::new("/root")).unwrap();
        let once = normalizer.normalize_str(&path);
        prop_assert_eq!(normalizer.normalize_str(&once), once);
    }

    // Cellar paths differing only in the version directory share a key.
    #[test]
    fn cellar_versions_share_a_key(
        pkg in name_strategy(),
        a in version_strategy(),
        b in version_strategy(),
    ) {
        let normalizer = Normalizer::for_root(Path::new("/root")).unwrap();
        prop_assert_eq!(
            normalizer.normalize_str(&format!("/root/Cellar/{pkg}/{a}/bin/tool")),
            normalizer.normalize_str(&format!("/root/Cellar/{pkg}/{b}/bin/tool"))
        );
    }

    // Comparing a set with itself always passes without warnings.
    #[test]
    fn self_comparison_passes(paths in prop::collection::btree_set(path_strategy(), 0..20)) {
        let snapshot: Snapshot = paths.into_iter().map(|p| (PathBuf::from(p), String::new())).collect();
        let verifier = Verifier::for_root(Path::new("/root")).unwrap();
        let report = verifier.compare(Path::new("b"), &snapshot, &snapshot);
        prop_assert!(report.passed());
        prop_assert!(report.version_mismatches.is_empty());
    }
}
