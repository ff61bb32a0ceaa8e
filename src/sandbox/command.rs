//! Process handles for the sandbox executable

use std::ffi::OsStr;
use std::path::Path;
use tracing::debug;

use super::builder::Sandbox;
use super::config::get_config;

impl Sandbox {
    /// Blocking [`std::process::Command`] that runs `program` inside this
    /// sandbox through the configured sandbox executable. Stdio, spawning and
    /// waiting are left to the caller.
    pub fn command<I, S>(&self, program: &str, args: I) -> std::process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command_with(&get_config().sandbox_path, program, args)
    }

    /// Like [`Sandbox::command`] with an explicit sandbox executable
    pub fn command_with<I, S>(
        &self,
        sandbox_path: impl AsRef<OsStr>,
        program: &str,
        args: I,
    ) -> std::process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exec_args = self.build_exec_args(program, args);
        debug!(
            "Sandbox command: {:?} {:?}",
            Path::new(sandbox_path.as_ref()),
            exec_args
        );

        let mut cmd = std::process::Command::new(sandbox_path);
        cmd.args(&exec_args);
        cmd
    }

    /// Async counterpart of [`Sandbox::command`]. The child is killed when the
    /// handle or its wait future is dropped, so abandoning the wait (timeout,
    /// `select!`) terminates the sandboxed process.
    pub fn async_command<I, S>(&self, program: &str, args: I) -> tokio::process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.async_command_with(&get_config().sandbox_path, program, args)
    }

    /// Like [`Sandbox::async_command`] with an explicit sandbox executable
    pub fn async_command_with<I, S>(
        &self,
        sandbox_path: impl AsRef<OsStr>,
        program: &str,
        args: I,
    ) -> tokio::process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cmd = tokio::process::Command::from(self.command_with(sandbox_path, program, args));
        cmd.kill_on_drop(true);
        cmd
    }
}
