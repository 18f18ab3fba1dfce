//! Main entry point for the bundledeps CLI.
//!
//! Commands:
//! - `collect`: compute the closure and verify it against the baseline
//! - `resolve`, `normalize`, `parse-trace`: inspect single steps
//! - `verify`, `stage`: work from a saved registry file

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let _logger = bundledeps::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        root: cli.root,
        arch: cli.arch,
    };

    let result = match cli.command {
        cli::Command::Collect(cmd) => cmd.execute(&global),
        cli::Command::Resolve(cmd) => cmd.execute(&global),
        cli::Command::Verify(cmd) => cmd.execute(&global),
        cli::Command::Normalize(cmd) => cmd.execute(&global),
        cli::Command::ParseTrace(cmd) => cmd.execute(&global),
        cli::Command::Stage(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
