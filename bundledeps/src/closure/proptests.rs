//! Property-based tests for closure resolution.

use super::{Annotation, ClosureResolver};
use crate::fs::MockFileSystem;
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // A chain of N symlinks outside bin/ yields N symlink entries and one
    // real file.
    #[test]
    fn chain_records_every_hop(names in prop::collection::hash_set(name_strategy(), 2..10)) {
        let names: Vec<String> = names.into_iter().collect();
        let (last, links) = names.split_last().unwrap();

        let mut fs = MockFileSystem::new().with_file(format!("/r/lib/{last}"), 4096);
        for (index, name) in links.iter().enumerate() {
            let next = names[index + 1].clone();
            fs = fs.with_symlink(format!("/r/lib/{name}"), next);
        }

        let mut resolver = ClosureResolver::new(&fs, "/r");
        resolver.resolve(&PathBuf::from(format!("/r/lib/{}", names[0]))).unwrap();

        let registry = resolver.registry();
        prop_assert_eq!(registry.len(), names.len());
        let symlinks = registry.iter().filter(|(_, a)| a.is_symlink()).count();
        prop_assert_eq!(symlinks, links.len());
        prop_assert_eq!(
            registry.get(Path::new(&format!("/r/lib/{last}"))),
            Some(&Annotation::RealFile("4.0K".into()))
        );
    }

    // Resolving the same inputs twice, in any order, gives the same registry.
    #[test]
    fn resolution_is_order_independent(
        names in prop::collection::btree_set(name_strategy(), 1..8),
        reverse in any::<bool>(),
    ) {
        let mut fs = MockFileSystem::new();
        for name in &names {
            fs = fs
                .with_file(format!("/r/Cellar/{name}/1.0/lib/lib{name}.dylib"), 100)
                .with_symlink(format!("/r/opt/{name}"), format!("../Cellar/{name}/1.0"));
        }
        let mut raws: Vec<PathBuf> = names
            .iter()
            .map(|name| PathBuf::from(format!("/r/opt/{name}/lib/lib{name}.dylib")))
            .collect();

        let mut forward = ClosureResolver::new(&fs, "/r");
        forward.resolve_all(raws.clone()).unwrap();

        if reverse {
            raws.reverse();
        }
        let mut other = ClosureResolver::new(&fs, "/r");
        other.resolve_all(raws.clone()).unwrap();
        prop_assert_eq!(other.resolve_all(raws).unwrap(), 0);

        prop_assert_eq!(forward.registry(), other.registry());
    }
}
