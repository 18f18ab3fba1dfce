//! CLI command implementations.
//!
//! - `collect`: compute and verify the full closure
//! - `resolve`: resolve individual paths
//! - `verify`: compare a registry file with a baseline
//! - `normalize`: print version-agnostic keys
//! - `parse_trace`: list qualifying trace events
//! - `stage`: stage a registry and plan linkage fixes
//! - `validate`: validate a configuration file
//! - `completions`: shell completion scripts

pub mod collect;
pub mod completions;
pub mod normalize;
pub mod parse_trace;
pub mod resolve;
pub mod stage;
pub mod validate;
pub mod verify;

pub use collect::CollectCommand;
pub use completions::CompletionsCommand;
pub use normalize::NormalizeCommand;
pub use parse_trace::ParseTraceCommand;
pub use resolve::ResolveCommand;
pub use stage::StageCommand;
pub use validate::ValidateCommand;
pub use verify::VerifyCommand;
