//! Error types for sandbox invocation.
//!
//! Building and rendering a sandbox configuration cannot fail; everything here
//! happens at spawn or wait time. Exit codes of the sandbox executable are
//! reported as-is, their meaning belongs to that tool.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    /// The sandbox executable could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing stdin to the child failed
    #[error("failed to write stdin: {0}")]
    Stdin(#[source] std::io::Error),

    /// Waiting for the child failed
    #[error("failed to wait for sandbox: {0}")]
    Wait(#[source] std::io::Error),

    /// The deadline passed and the child was killed
    #[error("sandbox timed out after {limit:?}")]
    TimedOut { limit: Duration },

    /// The run was cancelled and the child was killed
    #[error("sandbox run cancelled")]
    Cancelled,

    /// The sandbox executable exited with a non-zero code
    #[error("sandbox exited with code {code}")]
    NonZeroExit { code: i32, stderr: String },

    /// The sandbox executable was killed by a signal
    #[error("sandbox killed by signal {signal}")]
    Signaled { signal: i32 },
}

pub type Result<T> = std::result::Result<T, LaunchError>;
