//! Library exports for bundledeps-cli.
//!
//! The CLI structure is exported for documentation tooling.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
