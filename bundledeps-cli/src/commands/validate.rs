//! Command to validate a configuration file.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use bundledeps::config::{ConfigLoader, ConfigValidator};
use clap::Args;
use std::path::PathBuf;

/// Validate a bundledeps configuration file.
#[derive(Args)]
pub struct ValidateCommand {
    /// Configuration file to validate
    #[arg(value_name = "CONFIG_PATH")]
    pub config_path: PathBuf,
}

impl ValidateCommand {
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        if !self.config_path.exists() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                self.config_path.display()
            )));
        }

        let config = match ConfigLoader::load_file(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Parse error: {e}");
                return Err(CliError::Config("Configuration file is invalid".to_string()));
            }
        };

        match ConfigValidator::validate(&config) {
            Ok(()) => {
                println!("Configuration is valid");
                Ok(())
            }
            Err(e) => {
                eprintln!("Validation error: {e}");
                Err(CliError::Config(
                    "Configuration validation failed".to_string(),
                ))
            }
        }
    }
}
