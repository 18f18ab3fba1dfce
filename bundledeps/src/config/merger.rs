//! Configuration merging and precedence handling.

use crate::config::loader::ConfigSource;
use crate::config::schema::{Config, SeedConfig, TraceSettings};

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use bundledeps::config::{Config, ConfigMerger};
///
/// let low = Config { qemu_version: Some("8.2".to_string()), ..Default::default() };
/// let high = Config { qemu_version: Some("9.0".to_string()), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.qemu_version, Some("9.0".to_string()));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge sources ordered from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();
        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }
        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// Simple fields and lists are replaced when set in `source`; `seeds`
    /// and `trace` are merged field by field.
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.root.is_some() {
            target.root.clone_from(&source.root);
        }
        if source.arch.is_some() {
            target.arch = source.arch;
        }
        if source.qemu_version.is_some() {
            target.qemu_version.clone_from(&source.qemu_version);
        }
        if source.templates.is_some() {
            target.templates.clone_from(&source.templates);
        }
        if source.template_dir.is_some() {
            target.template_dir.clone_from(&source.template_dir);
        }
        if source.instance_dir.is_some() {
            target.instance_dir.clone_from(&source.instance_dir);
        }
        if source.baseline_dir.is_some() {
            target.baseline_dir.clone_from(&source.baseline_dir);
        }
        if source.alias_search_dir.is_some() {
            target.alias_search_dir.clone_from(&source.alias_search_dir);
        }
        if source.max_symlink_hops.is_some() {
            target.max_symlink_hops = source.max_symlink_hops;
        }
        if source.stage_dir.is_some() {
            target.stage_dir.clone_from(&source.stage_dir);
        }

        if let Some(seeds) = &source.seeds {
            Self::merge_seeds(target.seeds.get_or_insert_with(Default::default), seeds);
        }
        if let Some(trace) = &source.trace {
            Self::merge_trace(target.trace.get_or_insert_with(Default::default), trace);
        }
    }

    fn merge_seeds(target: &mut SeedConfig, source: &SeedConfig) {
        if source.executables.is_some() {
            target.executables.clone_from(&source.executables);
        }
        if source.support_dirs.is_some() {
            target.support_dirs.clone_from(&source.support_dirs);
        }
        if source.resource_dirs.is_some() {
            target.resource_dirs.clone_from(&source.resource_dirs);
        }
    }

    fn merge_trace(target: &mut TraceSettings, source: &TraceSettings) {
        if source.program.is_some() {
            target.program.clone_from(&source.program);
        }
        if source.stop.is_some() {
            target.stop.clone_from(&source.stop);
        }
        if source.log_path.is_some() {
            target.log_path.clone_from(&source.log_path);
        }
        if source.settle_seconds.is_some() {
            target.settle_seconds = source.settle_seconds;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(precedence: u8, config: Config) -> ConfigSource {
        ConfigSource {
            path: PathBuf::from(format!("/cfg/{precedence}.yaml")),
            precedence,
            config,
        }
    }

    #[test]
    fn test_higher_precedence_wins() {
        let low = Config {
            root: Some("/usr/local".into()),
            templates: Some(vec!["alpine".into(), "default".into()]),
            ..Default::default()
        };
        let high = Config {
            templates: Some(vec!["fedora".into()]),
            ..Default::default()
        };

        let merged = ConfigMerger::merge(vec![source(1, low), source(2, high)]);
        assert_eq!(merged.root, Some(PathBuf::from("/usr/local")));
        assert_eq!(merged.templates, Some(vec!["fedora".to_string()]));
    }

    #[test]
    fn test_nested_sections_merge_field_by_field() {
        let mut target = Config {
            trace: Some(TraceSettings {
                log_path: Some("/tmp/a.log".into()),
                settle_seconds: Some(2),
                ..Default::default()
            }),
            seeds: Some(SeedConfig {
                executables: Some(vec!["bin/limactl".into()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let source = Config {
            trace: Some(TraceSettings {
                settle_seconds: Some(0),
                ..Default::default()
            }),
            seeds: Some(SeedConfig {
                resource_dirs: Some(Vec::new()),
                ..Default::default()
            }),
            ..Default::default()
        };

        ConfigMerger::merge_into(&mut target, &source);
        let trace = target.trace.unwrap();
        assert_eq!(trace.log_path, Some(PathBuf::from("/tmp/a.log")));
        assert_eq!(trace.settle_seconds, Some(0));
        let seeds = target.seeds.unwrap();
        assert_eq!(seeds.executables, Some(vec!["bin/limactl".to_string()]));
        assert_eq!(seeds.resource_dirs, Some(Vec::new()));
    }

    #[test]
    fn test_empty_merge_is_default() {
        assert_eq!(ConfigMerger::merge(Vec::new()), Config::default());
    }
}
