//! Sandbox module - Builder and argument rendering for the sandbox executable
//!
//! This module provides a declarative description of a sandboxed run.
//! It handles:
//! - Accumulating files, mounts, environment and limits (`Sandbox`)
//! - Rendering them into the executable's argument vector
//! - Producing process handles bound to the configured executable
//! - Process-wide launcher configuration
//!
//! The sandbox module does NOT:
//! - Validate paths, limits or environment entries
//! - Enforce any isolation (that's the sandbox executable's job)
//! - Interpret exit codes

pub mod args;
pub mod builder;
pub mod command;
pub mod config;

// Re-exports for convenience
pub use args::CompiledArgs;
pub use builder::{DirMount, FileMapping, Sandbox};
pub use config::{get_config, init_config, LauncherConfig, DEFAULT_SANDBOX_PATH};
