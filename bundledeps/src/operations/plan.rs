//! Plan types for the collection pipeline.
//!
//! A plan lists every step a collection run takes, so that it can be shown
//! in dry-run mode before anything is touched.

use std::path::PathBuf;

use crate::closure::SeedSet;

/// A single step of a collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// Resolve the static entry points.
    SeedStatic {
        /// Entry points, with placeholders.
        seeds: SeedSet,
        /// qemu version substituted for `{version}`.
        version: String,
    },

    /// Start the background tracer.
    StartTrace {
        /// Executable names the trace is scoped to.
        executables: Vec<String>,
    },

    /// Boot, smoke-test, stop and delete one VM template.
    RunTemplate {
        /// Template name.
        name: String,
    },

    /// Stop the background tracer.
    StopTrace,

    /// Resolve every file the tracer saw.
    IngestTrace {
        /// The tracer's log.
        log_path: PathBuf,
    },

    /// Compare the registry with the baseline snapshot.
    Verify {
        /// The baseline file.
        baseline: PathBuf,
    },

    /// Write the registry as a new snapshot.
    WriteBaseline {
        /// Destination file.
        path: PathBuf,
    },
}

impl PlanAction {
    /// Returns a human-readable description of this action.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::SeedStatic { seeds, version } => format!(
                "Resolve {} executables, {} support directories and {} resource directories (qemu {version})",
                seeds.executables.len(),
                seeds.support_dirs.len(),
                seeds.resource_dirs.len()
            ),
            Self::StartTrace { executables } => {
                format!("Start file-access trace for {}", executables.join(", "))
            }
            Self::RunTemplate { name } => format!("Run VM template {name}"),
            Self::StopTrace => "Stop file-access trace".to_string(),
            Self::IngestTrace { log_path } => {
                format!("Resolve files recorded in {}", log_path.display())
            }
            Self::Verify { baseline } => {
                format!("Verify dependencies against {}", baseline.display())
            }
            Self::WriteBaseline { path } => {
                format!("Write dependency snapshot to {}", path.display())
            }
        }
    }
}

/// A complete plan describing all actions to be taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPlan {
    /// A human-readable description of the operation.
    pub description: String,

    /// The sequence of actions to perform.
    pub actions: Vec<PlanAction>,

    /// Warnings to communicate to the user.
    pub warnings: Vec<String>,
}

impl OperationPlan {
    /// Creates an empty plan.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundledeps::operations::OperationPlan;
    ///
    /// let plan = OperationPlan::new("Collect dependencies");
    /// assert_eq!(plan.description, "Collect dependencies");
    /// assert!(plan.is_empty());
    /// ```
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            actions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an action to the plan.
    #[must_use]
    pub fn add_action(mut self, action: PlanAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Adds a warning to the plan.
    #[must_use]
    pub fn add_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Checks if the plan has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the number of actions in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Descriptions of every action, in order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.actions.iter().map(PlanAction::description).collect()
    }
}
