//! Property-based tests for configuration merging.

use super::merger::ConfigMerger;
use super::schema::{Config, TraceSettings};
use proptest::prelude::*;

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of("/[a-z]{1,10}"),
        prop::option::of("[0-9]{1,2}\\.[0-9]{1,2}"),
        prop::option::of(prop::collection::vec("[a-z]{1,8}", 1..4)),
        prop::option::of(1usize..=1024),
        prop::option::of(0u64..=60),
    )
        .prop_map(|(root, qemu_version, templates, hops, settle)| Config {
            root: root.map(Into::into),
            qemu_version,
            templates,
            max_symlink_hops: hops,
            trace: settle.map(|seconds| TraceSettings {
                settle_seconds: Some(seconds),
                ..Default::default()
            }),
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);

        prop_assert_eq!(&merged.root, if high.root.is_some() { &high.root } else { &low.root });
        prop_assert_eq!(
            &merged.qemu_version,
            if high.qemu_version.is_some() { &high.qemu_version } else { &low.qemu_version }
        );
        prop_assert_eq!(
            &merged.templates,
            if high.templates.is_some() { &high.templates } else { &low.templates }
        );
        prop_assert_eq!(
            merged.max_symlink_hops,
            high.max_symlink_hops.or(low.max_symlink_hops)
        );
    }

    #[test]
    fn merge_with_default_is_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(merged, config);
    }

    #[test]
    fn merge_is_idempotent(low in config_strategy(), high in config_strategy()) {
        let mut once = low.clone();
        ConfigMerger::merge_into(&mut once, &high);
        let mut twice = once.clone();
        ConfigMerger::merge_into(&mut twice, &high);
        prop_assert_eq!(once, twice);
    }
}
