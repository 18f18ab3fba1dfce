//! Planning a full closure computation.

use std::path::PathBuf;

use crate::config::ResolvedConfig;

use super::plan::{OperationPlan, PlanAction};

/// Options for a collection run.
///
/// # Examples
///
/// ```
/// use bundledeps::operations::CollectOptions;
///
/// let options = CollectOptions::new()
///     .with_templates(vec!["alpine".into()])
///     .without_verify();
/// assert!(options.trace);
/// assert!(!options.verify);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectOptions {
    /// Templates to run instead of the configured ones.
    pub templates: Option<Vec<String>>,
    /// Whether runtime discovery runs.
    pub trace: bool,
    /// Whether the registry is compared with the baseline.
    pub verify: bool,
    /// Where to write the registry as a snapshot, if anywhere.
    pub write_baseline: Option<PathBuf>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            templates: None,
            trace: true,
            verify: true,
            write_baseline: None,
        }
    }
}

impl CollectOptions {
    /// Creates options for a full run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `templates` instead of the configured ones.
    #[must_use]
    pub fn with_templates(mut self, templates: Vec<String>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Skips runtime discovery.
    #[must_use]
    pub fn without_trace(mut self) -> Self {
        self.trace = false;
        self
    }

    /// Skips verification.
    #[must_use]
    pub fn without_verify(mut self) -> Self {
        self.verify = false;
        self
    }

    /// Writes the registry as a snapshot to `path`.
    #[must_use]
    pub fn with_write_baseline(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_baseline = Some(path.into());
        self
    }
}

/// Builds the [`OperationPlan`] of a collection run.
#[derive(Debug)]
pub struct CollectPlan<'a> {
    options: CollectOptions,
    config: &'a ResolvedConfig,
}

impl<'a> CollectPlan<'a> {
    /// Creates a planner.
    #[must_use]
    pub fn new(options: CollectOptions, config: &'a ResolvedConfig) -> Self {
        Self { options, config }
    }

    /// Builds the plan for the installed qemu `version`.
    ///
    /// Order: seed, then start trace, templates, stop trace and ingest,
    /// then verification and snapshot writing.
    #[must_use]
    pub fn build_plan(&self, version: &str) -> OperationPlan {
        let config = self.config;
        let mut plan = OperationPlan::new(format!(
            "Collect dependencies under {} ({})",
            config.root.display(),
            config.arch
        ))
        .add_action(PlanAction::SeedStatic {
            seeds: config.seeds.clone(),
            version: version.to_string(),
        });

        let templates = self
            .options
            .templates
            .as_ref()
            .unwrap_or(&config.templates);

        if self.options.trace {
            if templates.is_empty() {
                plan = plan.add_warning("no templates selected; runtime discovery will see nothing");
            }
            plan = plan.add_action(PlanAction::StartTrace {
                executables: config.seeds.executable_names(config.arch, version),
            });
            for name in templates {
                plan = plan.add_action(PlanAction::RunTemplate { name: name.clone() });
            }
            plan = plan
                .add_action(PlanAction::StopTrace)
                .add_action(PlanAction::IngestTrace {
                    log_path: config.trace.log_path.clone(),
                });
        } else {
            plan = plan.add_warning("runtime discovery disabled; the closure holds static seeds only");
        }

        if self.options.verify {
            plan = plan.add_action(PlanAction::Verify {
                baseline: config.baseline_path(),
            });
        }
        if let Some(path) = &self.options.write_baseline {
            plan = plan.add_action(PlanAction::WriteBaseline { path: path.clone() });
        }

        plan
    }
}
