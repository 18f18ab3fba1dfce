//! Plan execution engine.
//!
//! Runs a collection plan against a filesystem and a process runner. The
//! tracer is always stopped once started, even when a template fails.

use serde::Serialize;

use crate::closure::{seed, ClosureResolver, DependencyRegistry};
use crate::config::ResolvedConfig;
use crate::error::{Outcome, Result};
use crate::fs::FileSystem;
use crate::observe::{IngestStats, RuntimeObserver, TemplateRunner, TraceSession};
use crate::process::ProcessRunner;
use crate::verify::{write_snapshot, VerificationReport, Verifier};

use super::plan::{OperationPlan, PlanAction};

/// Result of executing a collection plan.
#[derive(Debug, Clone, Serialize)]
pub struct CollectResult {
    /// Whether this was a dry run (nothing executed).
    pub dry_run: bool,

    /// Descriptions of actions taken (or that would be taken in dry-run).
    pub actions_taken: Vec<String>,

    /// Warnings from the plan.
    pub warnings: Vec<String>,

    /// The computed closure.
    pub registry: DependencyRegistry,

    /// Runtime discovery outcome, if it ran.
    pub ingest: Option<Outcome<IngestStats>>,

    /// Verification outcome, if it ran.
    pub verification: Option<Outcome<VerificationReport>>,
}

impl CollectResult {
    /// Returns `false` only if verification ran and found differences.
    #[must_use]
    pub fn verification_passed(&self) -> bool {
        match &self.verification {
            Some(Outcome::Completed(report)) => report.passed(),
            _ => true,
        }
    }
}

struct RunState<'r, F, R: ProcessRunner + ?Sized> {
    resolver: ClosureResolver<F>,
    session: Option<TraceSession<'r, R>>,
    actions_taken: Vec<String>,
    ingest: Option<Outcome<IngestStats>>,
    verification: Option<Outcome<VerificationReport>>,
}

/// Executes collection plans.
///
/// # Examples
///
/// ```
/// use bundledeps::config::{Config, ResolvedConfig};
/// use bundledeps::fs::MockFileSystem;
/// use bundledeps::operations::{CollectExecutor, CollectOptions, CollectPlan};
/// use bundledeps::process::SystemProcessRunner;
/// use bundledeps::Arch;
///
/// let config = ResolvedConfig::with_arch(Config::default(), Arch::Aarch64);
/// let plan = CollectPlan::new(CollectOptions::new(), &config).build_plan("9.0.2");
///
/// let fs = MockFileSystem::new();
/// let runner = SystemProcessRunner;
/// let result = CollectExecutor::new(&fs, &runner, &config).dry_run().execute(&plan).unwrap();
/// assert!(result.dry_run);
/// assert_eq!(result.actions_taken.len(), plan.len());
/// ```
pub struct CollectExecutor<'a, F: ?Sized, R: ?Sized> {
    fs: &'a F,
    runner: &'a R,
    config: &'a ResolvedConfig,
    dry_run: bool,
}

impl<'a, F, R> CollectExecutor<'a, F, R>
where
    F: FileSystem + ?Sized,
    R: ProcessRunner + ?Sized,
{
    /// Creates an executor.
    #[must_use]
    pub const fn new(fs: &'a F, runner: &'a R, config: &'a ResolvedConfig) -> Self {
        Self {
            fs,
            runner,
            config,
            dry_run: false,
        }
    }

    /// Lists the plan's actions without running them.
    #[must_use]
    pub const fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Executes the plan.
    ///
    /// Verification differences are reported in the result, not as an
    /// error; see [`CollectResult::verification_passed`].
    ///
    /// # Errors
    ///
    /// Returns the first fatal error. A template failure stops the tracer
    /// before it is returned.
    pub fn execute(&self, plan: &OperationPlan) -> Result<CollectResult> {
        if self.dry_run {
            return Ok(CollectResult {
                dry_run: true,
                actions_taken: plan.descriptions(),
                warnings: plan.warnings.clone(),
                registry: DependencyRegistry::new(),
                ingest: None,
                verification: None,
            });
        }
        for warning in &plan.warnings {
            log::warn!("{warning}");
        }

        let mut state = RunState {
            resolver: ClosureResolver::new(self.fs, &self.config.root)
                .with_max_hops(self.config.max_symlink_hops),
            session: None,
            actions_taken: Vec::with_capacity(plan.len()),
            ingest: None,
            verification: None,
        };

        let mut failure = None;
        for action in &plan.actions {
            if let Err(e) = self.apply(action, &mut state) {
                failure = Some(e);
                break;
            }
            state.actions_taken.push(action.description());
        }

        if let Some(session) = state.session.take() {
            match session.stop() {
                Ok(_) => state.actions_taken.push(PlanAction::StopTrace.description()),
                Err(e) if failure.is_some() => log::warn!("failed to stop trace: {e}"),
                Err(e) => failure = Some(e),
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        Ok(CollectResult {
            dry_run: false,
            actions_taken: state.actions_taken,
            warnings: plan.warnings.clone(),
            registry: state.resolver.into_registry(),
            ingest: state.ingest,
            verification: state.verification,
        })
    }

    fn apply(&self, action: &PlanAction, state: &mut RunState<'a, &'a F, R>) -> Result<()> {
        let config = self.config;
        match action {
            PlanAction::SeedStatic { seeds, version } => {
                let added = seed(&mut state.resolver, seeds, config.arch, version)?;
                log::info!("static seeding recorded {added} dependencies");
            }
            PlanAction::StartTrace { executables } => {
                state.session = Some(TraceSession::start(
                    self.runner,
                    config.trace.clone(),
                    executables,
                )?);
            }
            PlanAction::RunTemplate { name } => {
                TemplateRunner::new(
                    self.runner,
                    self.fs,
                    &config.template_dir,
                    config.instance_dir()?,
                )
                .run(name)?;
            }
            PlanAction::StopTrace => {
                if let Some(session) = state.session.take() {
                    session.stop()?;
                }
            }
            PlanAction::IngestTrace { log_path } => {
                let observer = RuntimeObserver::new(&config.root)?
                    .with_alias_dir(&config.alias_search_dir);
                state.ingest = Some(observer.ingest(&mut state.resolver, log_path)?);
            }
            PlanAction::Verify { baseline } => {
                let verifier = Verifier::for_root(&config.root)?;
                state.verification =
                    Some(verifier.verify(self.fs, baseline, state.resolver.registry())?);
            }
            PlanAction::WriteBaseline { path } => {
                write_snapshot(self.fs, path, &state.resolver.registry().to_snapshot())?;
                log::info!("wrote dependency snapshot to {}", path.display());
            }
        }
        Ok(())
    }
}
