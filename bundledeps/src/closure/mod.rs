//! Dependency-closure computation.
//!
//! The closure of a set of executables is every file and symlink needed to
//! run them from a relocated copy of the installation:
//!
//! - [`ClosureResolver`] walks a raw path through every symlink segment,
//!   recording each intermediate link and the final real file.
//! - [`DependencyRegistry`] holds the result, keyed on absolute path.
//! - [`seed`] pushes the fixed entry points through the resolver.
//!
//! Runtime discovery lives in [`crate::observe`] and verification in
//! [`crate::verify`]; both feed or read the same registry.

pub mod registry;
pub mod resolver;
pub mod seed;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use registry::{Annotation, DependencyRegistry};
pub use resolver::{ClosureResolver, Traversal, DEFAULT_MAX_HOPS};
pub use seed::{seed, ExpandedSeeds, SeedSet};
