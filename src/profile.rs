//! Sandbox profiles
//!
//! A profile is a TOML file describing a sandbox shape, so the same setup can
//! be reused across runs without repeating every flag.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::sandbox::Sandbox;

/// Sandbox profile as stored on disk
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SandboxProfile {
    /// Sandbox root directory
    pub root: String,
    #[serde(default)]
    pub files: Vec<ProfileFile>,
    #[serde(default)]
    pub mount_dirs: Vec<ProfileMount>,
    /// Raw `KEY=VALUE` entries
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub no_new_net: bool,
    pub cgroup: Option<String>,
    pub cpuset: Option<String>,
    /// Bytes, or a size string such as "512M"
    pub mem_limit: Option<MemLimit>,
    pub save_usage_stat: Option<String>,
    pub exec_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileFile {
    pub src: String,
    /// Defaults to `src`
    pub dst: Option<String>,
    #[serde(default)]
    pub with_libs: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileMount {
    pub src: String,
    /// Defaults to `src`
    pub dst: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MemLimit {
    Bytes(u64),
    Size(String),
}

impl MemLimit {
    pub fn bytes(&self) -> anyhow::Result<u64> {
        match self {
            MemLimit::Bytes(bytes) => Ok(*bytes),
            MemLimit::Size(size) => parse_memory_size(size),
        }
    }
}

impl SandboxProfile {
    /// Parse a profile from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let profile: SandboxProfile = toml::from_str(content)?;
        // Surface bad sizes at load time rather than at build time
        if let Some(limit) = &profile.mem_limit {
            limit.bytes().context("Invalid mem_limit")?;
        }
        Ok(profile)
    }

    /// Load a profile from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse profile {:?}", path))
    }

    /// Replay the profile through the builder, lists in document order
    pub fn into_sandbox(self) -> anyhow::Result<Sandbox> {
        let mut sandbox = Sandbox::new(self.root);

        for file in self.files {
            let dst = file.dst.unwrap_or_else(|| file.src.clone());
            sandbox.add_file(file.src, dst, file.with_libs);
        }
        for mount in self.mount_dirs {
            let dst = mount.dst.unwrap_or_else(|| mount.src.clone());
            sandbox.mount_dir(mount.src, dst);
        }
        for entry in self.env {
            sandbox.add_env(entry);
        }

        sandbox.set_no_new_net(self.no_new_net);
        if let Some(cgroup) = self.cgroup {
            sandbox.set_cgroup(cgroup);
        }
        if let Some(cpuset) = self.cpuset {
            sandbox.set_cpuset(cpuset);
        }
        if let Some(limit) = self.mem_limit {
            sandbox.set_mem_limit(limit.bytes()?);
        }
        if let Some(path) = self.save_usage_stat {
            sandbox.save_usage_stat(path);
        }
        if let Some(dir) = self.exec_dir {
            sandbox.set_exec_dir(dir);
        }

        Ok(sandbox)
    }
}

/// Parse a memory size like "512M", "1G", "64k" or "1048576" into bytes.
/// Suffixes are binary multiples.
pub fn parse_memory_size(s: &str) -> anyhow::Result<u64> {
    let s = s.trim().to_uppercase();

    let (num_str, multiplier) = match s.chars().last() {
        Some('G') => (&s[..s.len() - 1], 1024u64 * 1024 * 1024),
        Some('M') => (&s[..s.len() - 1], 1024u64 * 1024),
        Some('K') => (&s[..s.len() - 1], 1024u64),
        Some('B') => (&s[..s.len() - 1], 1u64),
        _ => (s.as_str(), 1u64),
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid memory size: {}", s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Memory size overflow: {}", s))
}
