//! Launcher configuration
//!
//! Location of the sandbox executable and the default deadline, loaded from
//! environment or set once at process start.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

/// Conventional install location of the sandbox executable
pub const DEFAULT_SANDBOX_PATH: &str = "/usr/bin/sandbox";

/// Launcher configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherConfig {
    /// Path of the sandbox executable
    pub sandbox_path: PathBuf,
    /// Default deadline for a sandboxed run (None = wait forever)
    pub timeout: Option<Duration>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            sandbox_path: PathBuf::from(DEFAULT_SANDBOX_PATH),
            timeout: None,
        }
    }
}

impl LauncherConfig {
    /// Build config from `SANDBOX_PATH` and `SANDBOX_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("SANDBOX_PATH").filter(|p| !p.is_empty()) {
            config.sandbox_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("SANDBOX_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(0) => {}
                Ok(secs) => config.timeout = Some(Duration::from_secs(secs)),
                Err(_) => warn!("Ignoring invalid SANDBOX_TIMEOUT_SECS={:?}", raw),
            }
        }

        config
    }

    pub fn with_sandbox_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sandbox_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Global launcher configuration
static LAUNCHER_CONFIG: OnceLock<LauncherConfig> = OnceLock::new();

/// Initialize the launcher configuration. Only the first call succeeds.
pub fn init_config(config: LauncherConfig) -> anyhow::Result<&'static LauncherConfig> {
    LAUNCHER_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Launcher configuration already initialized"))?;

    Ok(get_config())
}

/// Get launcher configuration
pub fn get_config() -> &'static LauncherConfig {
    LAUNCHER_CONFIG.get().unwrap_or_else(|| {
        static DEFAULT: OnceLock<LauncherConfig> = OnceLock::new();

        DEFAULT.get_or_init(|| {
            warn!("Launcher configuration not initialized, using default");
            LauncherConfig::default()
        })
    })
}
