//! VM template lifecycle driven through `limactl`.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::process::{run_checked, CommandSpec, ProcessRunner};

/// Default templates exercised when none are named.
pub const DEFAULT_TEMPLATES: [&str; 2] = ["alpine", "default"];

/// Runs each template through start, smoke test, stop and delete.
#[derive(Debug)]
pub struct TemplateRunner<'a, R: ?Sized, F: ?Sized> {
    runner: &'a R,
    fs: &'a F,
    template_dir: PathBuf,
    instance_dir: PathBuf,
}

impl<'a, R, F> TemplateRunner<'a, R, F>
where
    R: ProcessRunner + ?Sized,
    F: FileSystem + ?Sized,
{
    /// Creates a runner reading `<template_dir>/<name>.yaml` and checking
    /// `<instance_dir>/<name>` for leftover instances.
    pub fn new(
        runner: &'a R,
        fs: &'a F,
        template_dir: impl Into<PathBuf>,
        instance_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            fs,
            template_dir: template_dir.into(),
            instance_dir: instance_dir.into(),
        }
    }

    /// Path of a template definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] if the definition does not exist.
    pub fn template_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.template_dir.join(format!("{name}.yaml"));
        if self.fs.exists(&path) {
            Ok(path)
        } else {
            Err(Error::TemplateNotFound {
                template: name.to_string(),
                dir: self.template_dir.clone(),
            })
        }
    }

    /// The commands [`Self::run`] issues for `name`, in order.
    #[must_use]
    pub fn commands(&self, name: &str, yaml: &Path) -> Vec<CommandSpec> {
        let mut commands = Vec::new();
        if self.fs.exists(&self.instance_dir.join(name)) {
            commands.push(limactl(["delete", "-f", name]));
        }
        commands.push(
            limactl(["start", "--tty=false", "--vm-type=qemu"]).arg(yaml.to_string_lossy()),
        );
        commands.push(limactl(["shell", name, "uname"]));
        commands.push(limactl(["stop", name]));
        commands.push(limactl(["delete", name]));
        commands
    }

    /// Runs one template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing or any lifecycle command
    /// fails.
    pub fn run(&self, name: &str) -> Result<()> {
        let yaml = self.template_path(name)?;
        log::info!("running template {name}");
        for command in self.commands(name, &yaml) {
            run_checked(self.runner, &command)?;
        }
        Ok(())
    }

    /// Runs every template in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub fn run_all<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            self.run(name.as_ref())?;
        }
        Ok(())
    }
}

fn limactl<const N: usize>(args: [&str; N]) -> CommandSpec {
    CommandSpec::new("limactl").args(args)
}
