//! Sandboxed runner implementation
//!
//! Runs a command through the sandbox executable and waits for it, with an
//! optional deadline and cancellation.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{CommandSpec, RunOutcome, RunStatus};
use crate::error::{LaunchError, Result};
use crate::sandbox::{LauncherConfig, Sandbox};

/// Runner that executes commands through the sandbox executable
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    /// Path of the sandbox executable
    sandbox_path: PathBuf,
    /// Kill the sandbox after this long
    timeout: Option<Duration>,
    /// Pass the parent's stdout/stderr through instead of capturing
    inherit_stdio: bool,
}

impl SandboxRunner {
    /// Create a runner for the given sandbox executable
    pub fn new(sandbox_path: impl AsRef<Path>) -> Self {
        Self {
            sandbox_path: sandbox_path.as_ref().to_path_buf(),
            timeout: None,
            inherit_stdio: false,
        }
    }

    /// Create a runner from launcher configuration
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(&config.sandbox_path).with_timeout(config.timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_inherit_stdio(mut self, value: bool) -> Self {
        self.inherit_stdio = value;
        self
    }

    pub fn sandbox_path(&self) -> &Path {
        &self.sandbox_path
    }

    /// Run a command in the sandbox and wait for it
    pub async fn run(
        &self,
        sandbox: &Sandbox,
        cmd: &CommandSpec,
        stdin: Option<&[u8]>,
    ) -> Result<RunOutcome> {
        self.run_until(sandbox, cmd, stdin, std::future::pending())
            .await
    }

    /// Run a command in the sandbox until it exits, the deadline passes or
    /// `cancel` resolves. In the latter two cases the child is killed.
    pub async fn run_until<F>(
        &self,
        sandbox: &Sandbox,
        cmd: &CommandSpec,
        stdin: Option<&[u8]>,
        cancel: F,
    ) -> Result<RunOutcome>
    where
        F: Future<Output = ()>,
    {
        let mut command = sandbox.async_command_with(&self.sandbox_path, &cmd.program, &cmd.args);
        command.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        if self.inherit_stdio {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: self.sandbox_path.display().to_string(),
            source,
        })?;
        debug!("Spawned sandbox pid={:?} for {:?}", child.id(), cmd.program);

        let stdin_pipe = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(input)) = (stdin_pipe, stdin) {
                match pipe.write_all(input).await {
                    // The child may exit without reading everything
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                        return Err(LaunchError::Stdin(e));
                    }
                    _ => {}
                }
            }
            Ok(())
        };
        let wait = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            let output = output.map_err(LaunchError::Wait)?;
            fed?;
            Ok::<_, LaunchError>(RunOutcome {
                status: RunStatus::from(output.status),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        };

        let deadline = async {
            match self.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        // Losing a branch drops the child, kill_on_drop takes care of it
        tokio::select! {
            outcome = wait => {
                if let Ok(outcome) = &outcome {
                    debug!("Sandbox finished with {:?}", outcome.status);
                }
                outcome
            }
            _ = deadline => {
                let limit = self.timeout.unwrap_or_default();
                warn!("Sandbox timed out after {:?}, killing it", limit);
                Err(LaunchError::TimedOut { limit })
            }
            _ = cancel => {
                warn!("Sandbox run cancelled, killing it");
                Err(LaunchError::Cancelled)
            }
        }
    }
}

impl Default for SandboxRunner {
    fn default() -> Self {
        Self::from_config(crate::sandbox::get_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = LauncherConfig::default()
            .with_sandbox_path("/opt/sandbox")
            .with_timeout(Some(Duration::from_secs(5)));
        let runner = SandboxRunner::from_config(&config);

        assert_eq!(runner.sandbox_path(), Path::new("/opt/sandbox"));
        assert_eq!(runner.timeout, Some(Duration::from_secs(5)));
        assert!(!runner.inherit_stdio);
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let runner = SandboxRunner::new("/nonexistent/sandbox-binary");
        let result = runner
            .run(&Sandbox::new("/x"), &CommandSpec::new("true"), None)
            .await;

        match result {
            Err(LaunchError::Spawn { program, source }) => {
                assert_eq!(program, "/nonexistent/sandbox-binary");
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_echo_receives_compiled_args() {
        let mut sandbox = Sandbox::new("/x");
        sandbox.add_env("A=1");
        let cmd = CommandSpec::new("prog").with_args(["arg"]);

        let runner = SandboxRunner::new("/bin/echo");
        let outcome = tokio_test::assert_ok!(runner.run(&sandbox, &cmd, None).await);

        assert!(outcome.is_success());
        assert_eq!(outcome.stdout_string(), "/x --env A=1 -- prog arg\n");
    }
}
