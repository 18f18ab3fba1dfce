#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # bundledeps
//!
//! Computes the complete set of files a relocatable bundle of installed
//! executables needs, starting from a package-manager installation root.
//!
//! The closure is built in two passes. Static seeding walks the symlink
//! chains of a fixed set of entry points; runtime discovery traces file
//! accesses while VM templates run and resolves everything that was touched.
//! The result is compared against a per-architecture baseline snapshot with
//! version-insensitive path keys.
//!
//! ## Core Types
//!
//! - [`ClosureResolver`] and [`DependencyRegistry`]: symlink-chain resolution
//! - [`SeedSet`]: static entry points
//! - [`observe::RuntimeObserver`]: trace-log ingestion
//! - [`verify::Verifier`]: baseline comparison
//! - [`Error`], [`Outcome`] and [`Result`]: error handling types
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use bundledeps::fs::MockFileSystem;
//! use bundledeps::{Annotation, ClosureResolver};
//! use std::path::Path;
//!
//! let fs = MockFileSystem::new()
//!     .with_file("/opt/homebrew/Cellar/qemu/9.0.2/bin/qemu-img", 2 * 1024 * 1024)
//!     .with_symlink("/opt/homebrew/bin/qemu-img", "../Cellar/qemu/9.0.2/bin/qemu-img");
//!
//! let mut resolver = ClosureResolver::new(&fs, "/opt/homebrew");
//! resolver.resolve(Path::new("/opt/homebrew/bin/qemu-img")).unwrap();
//!
//! let registry = resolver.registry();
//! assert_eq!(
//!     registry.get(Path::new("/opt/homebrew/Cellar/qemu/9.0.2/bin/qemu-img")),
//!     Some(&Annotation::RealFile("2.0M".into()))
//! );
//! ```

pub mod arch;
pub mod closure;
pub mod config;
pub mod error;
pub mod fs;
pub mod linkage;
pub mod logging;
pub mod observe;
pub mod operations;
pub mod output;
pub mod process;
pub mod stage;
pub mod toolchain;
pub mod verify;

// Re-export key types at crate root for convenience
pub use arch::Arch;
pub use closure::{Annotation, ClosureResolver, DependencyRegistry, SeedSet};
pub use config::{Config, ConfigBuilder, ResolvedConfig};
pub use error::{Error, ErrorClass, Outcome, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use operations::{
    CollectExecutor, CollectOptions, CollectPlan, CollectResult, OperationPlan, PlanAction,
};
pub use verify::{Normalizer, VerificationReport, Verifier};
