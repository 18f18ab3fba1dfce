//! Build script for bundledeps-cli.
//!
//! Generates the man page with clap_mangen into OUT_DIR. The command tree is
//! rebuilt here because a build script cannot depend on its own crate.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Keep in sync with src/cli.rs.
fn build_cli() -> Command {
    Command::new("bundledeps")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compute and verify the dependency closure of installed executables")
        .long_about(
            "Computes the set of files a relocatable lima + qemu bundle needs, starting from a \
             package-manager installation root, and verifies it against a per-architecture baseline",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file used instead of the discovered bundledeps.yaml")
                .value_name("PATH")
                .global(true)
                .env("BUNDLEDEPS_CONFIG"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .help("Installation root (defaults per architecture)")
                .value_name("PATH")
                .global(true),
        )
        .arg(
            Arg::new("arch")
                .long("arch")
                .help("Target architecture: x86_64 or aarch64 (defaults to the host)")
                .value_name("ARCH")
                .global(true),
        )
        .subcommands(vec![
            Command::new("collect")
                .about("Compute the full closure and verify it against the baseline")
                .long_about(
                    "Seed static entry points, trace VM template runs, ingest the trace and \
                     verify the result against the per-architecture baseline",
                ),
            Command::new("resolve")
                .about("Resolve paths and print the registry")
                .long_about("Follow the symlink chains of the given paths and print every recorded entry"),
            Command::new("verify")
                .about("Verify a registry file against a baseline")
                .long_about("Compare a saved registry with a baseline, ignoring version differences"),
            Command::new("normalize")
                .about("Print version-agnostic keys for paths")
                .long_about("Show the normalized key used when comparing against a baseline"),
            Command::new("parse-trace")
                .about("Print the qualifying events of a trace log")
                .long_about("List open and read events under the installation root without resolving them"),
            Command::new("stage")
                .about("Stage a registry and plan linkage fixes")
                .long_about("Copy a registry into a staging directory and emit the dylib rewrite and re-signing plan"),
            Command::new("validate")
                .about("Validate a configuration file")
                .long_about("Check a bundledeps configuration file for errors"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").unwrap_or_default());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let mut buffer = Vec::new();
    Man::new(build_cli()).render(&mut buffer)?;
    fs::write(man_dir.join("bundledeps.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
