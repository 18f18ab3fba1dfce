//! The collection pipeline using the plan-execute pattern.
//!
//! Planning lists every step of a run so it can be inspected in dry-run
//! mode; execution performs the steps against a filesystem and a process
//! runner.
//!
//! # Examples
//!
//! ```no_run
//! use bundledeps::config::{ConfigBuilder, ResolvedConfig};
//! use bundledeps::fs::HostFileSystem;
//! use bundledeps::operations::{CollectExecutor, CollectOptions, CollectPlan};
//! use bundledeps::process::SystemProcessRunner;
//!
//! let runner = SystemProcessRunner;
//! let config = ResolvedConfig::resolve(ConfigBuilder::new().build().unwrap(), &runner).unwrap();
//! let version = config.qemu_version(&runner).unwrap();
//!
//! let plan = CollectPlan::new(CollectOptions::new(), &config).build_plan(&version);
//! let result = CollectExecutor::new(&HostFileSystem, &runner, &config)
//!     .execute(&plan)
//!     .unwrap();
//! println!("{} dependencies", result.registry.len());
//! ```

pub mod collect;
pub mod executor;
pub mod plan;

pub use collect::{CollectOptions, CollectPlan};
pub use executor::{CollectExecutor, CollectResult};
pub use plan::{OperationPlan, PlanAction};
