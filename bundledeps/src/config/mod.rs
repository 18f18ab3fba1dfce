//! Layered configuration.
//!
//! Configuration is merged from several sources, highest precedence first:
//!
//! 1. Programmatic overrides (via [`ConfigBuilder::with_config`])
//! 2. Environment variables (`BUNDLEDEPS_*`)
//! 3. Project config (`bundledeps.yaml`, closest ancestor) or an explicit file
//! 4. User config (`~/.bundledeps/config.yaml`)
//! 5. Built-in defaults, applied by [`ResolvedConfig`]
//!
//! # Examples
//!
//! ```
//! use bundledeps::config::{Config, ConfigBuilder, ResolvedConfig};
//! use bundledeps::Arch;
//!
//! let config = ConfigBuilder::new()
//!     .skip_files()
//!     .skip_env()
//!     .with_config(Config { templates: Some(vec!["alpine".into()]), ..Default::default() })
//!     .build()
//!     .unwrap();
//!
//! let resolved = ResolvedConfig::with_arch(config, Arch::X86_64);
//! assert_eq!(resolved.templates, vec!["alpine".to_string()]);
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod resolved;
pub mod schema;
pub mod validator;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, ConfigSource, PROJECT_CONFIG_FILE};
pub use merger::ConfigMerger;
pub use resolved::ResolvedConfig;
pub use schema::{Config, SeedConfig, TraceSettings};
pub use validator::ConfigValidator;
