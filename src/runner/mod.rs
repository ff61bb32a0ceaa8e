//! Runner module - Process invocation layer
//!
//! Spawns the sandbox executable with a rendered argument vector and hands
//! back what happened:
//! - `SandboxRunner`: spawn, feed stdin, capture or inherit output, wait with
//!   an optional deadline or cancellation
//!
//! The runner module does NOT:
//! - Interpret exit codes or output of the sandbox executable
//! - Parse the usage statistics file
//! - Retry failed runs

pub mod sandboxed;

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use crate::error::{LaunchError, Result};

/// Command to run inside the sandbox
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program path as seen inside the sandbox
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self { program, args }
    }
}

/// How the sandbox executable terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Exited normally with the given code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }

    /// Shell-style exit code: the code itself, or 128 + signal
    pub fn exit_code(&self) -> i32 {
        match *self {
            RunStatus::Exited(code) => code,
            RunStatus::Signaled(signal) => 128 + signal,
        }
    }
}

impl From<ExitStatus> for RunStatus {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => RunStatus::Exited(code),
            (None, Some(signal)) => RunStatus::Signaled(signal),
            // Neither is possible for a reaped child on unix
            (None, None) => RunStatus::Exited(-1),
        }
    }
}

/// Outcome of running a program through the sandbox
#[derive(Debug)]
pub struct RunOutcome {
    /// Termination status of the sandbox executable
    pub status: RunStatus,
    /// Captured stdout (empty when stdio is inherited)
    pub stdout: Vec<u8>,
    /// Captured stderr (empty when stdio is inherited)
    pub stderr: Vec<u8>,
}

impl RunOutcome {
    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turn a non-zero exit or a signal into an error, keeping the outcome
    /// otherwise
    pub fn check(self) -> Result<Self> {
        match self.status {
            RunStatus::Exited(0) => Ok(self),
            RunStatus::Exited(code) => Err(LaunchError::NonZeroExit {
                code,
                stderr: self.stderr_string(),
            }),
            RunStatus::Signaled(signal) => Err(LaunchError::Signaled { signal }),
        }
    }
}

// Re-exports
pub use sandboxed::SandboxRunner;
