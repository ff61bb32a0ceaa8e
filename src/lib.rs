//! # sandbox-launcher
//!
//! Declarative builder and launcher for the `sandbox` executable.
//!
//! The crate only describes a sandboxed run and turns that description into
//! the executable's argument vector. Isolation, resource accounting and exit
//! codes are entirely the executable's business.
//!
//! ```no_run
//! use sandbox_launcher::{CommandSpec, Sandbox, SandboxRunner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sandbox = Sandbox::new("/tmp/sb");
//! sandbox
//!     .add_file("/usr/local/go/bin/go", "/bin/go", true)
//!     .add_env("PATH=/bin")
//!     .set_no_new_net(true)
//!     .set_mem_limit(512 * 1024 * 1024);
//!
//! let cmd = CommandSpec::new("go").with_args(["version"]);
//! let outcome = SandboxRunner::default().run(&sandbox, &cmd, None).await?;
//! println!("{}", outcome.stdout_string());
//! # Ok(())
//! # }
//! ```

#[cfg(not(unix))]
compile_error!("sandbox-launcher only supports unix targets");

pub mod cli;
pub mod error;
pub mod profile;
pub mod runner;
pub mod sandbox;

// Public API
pub use error::{LaunchError, Result};
pub use profile::{parse_memory_size, SandboxProfile};
pub use runner::{CommandSpec, RunOutcome, RunStatus, SandboxRunner};
pub use sandbox::{CompiledArgs, LauncherConfig, Sandbox};
