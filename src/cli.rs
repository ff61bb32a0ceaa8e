//! Command line interface for `sandbox-run`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use tracing::{debug, error};

use crate::error::LaunchError;
use crate::profile::{parse_memory_size, SandboxProfile};
use crate::runner::{CommandSpec, RunOutcome};
use crate::sandbox::{LauncherConfig, Sandbox};

/// Exit code reported when the deadline passes (same as coreutils `timeout`)
pub const EXIT_TIMED_OUT: i32 = 124;
/// Exit code reported when interrupted with Ctrl-C
pub const EXIT_CANCELLED: i32 = 130;
/// Exit code reported when the sandbox could not be run at all
pub const EXIT_LAUNCH_FAILED: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "sandbox-run")]
#[command(version, about = "Run a program through the sandbox executable", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Describe everything on the command line
    sandbox-run --root /tmp/sb --elf-file /usr/bin/python3 --no-new-net -- python3 -c 'print(1)'

    # Start from a profile, add a limit
    sandbox-run --profile files/go-test.toml --mem-limit 1G -- go test ./...

    # Show the argument vector without running anything
    sandbox-run --root /tmp/sb --print-args -- echo hi
")]
pub struct Cli {
    /// TOML profile describing the sandbox
    #[arg(short, long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Sandbox root directory (overrides the profile's root)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<String>,

    /// Expose a host file inside the sandbox
    #[arg(long = "file", value_name = "SRC[:DST]", value_parser = parse_mapping)]
    pub files: Vec<Mapping>,

    /// Expose an ELF binary together with its shared libraries
    #[arg(long = "elf-file", value_name = "SRC[:DST]", value_parser = parse_mapping)]
    pub elf_files: Vec<Mapping>,

    /// Mount a host directory inside the sandbox
    #[arg(long = "mount", value_name = "SRC[:DST]", value_parser = parse_mapping)]
    pub mounts: Vec<Mapping>,

    /// Environment entry passed to the program
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Isolate the program from the network (`--no-new-net=false` turns off
    /// a profile's setting)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub no_new_net: Option<bool>,

    /// Control group to run in
    #[arg(long, value_name = "NAME")]
    pub cgroup: Option<String>,

    /// CPUs the program may use
    #[arg(long, value_name = "SET")]
    pub cpuset: Option<String>,

    /// Memory limit (bytes, or 512M, 1G, ...)
    #[arg(long, value_name = "SIZE", value_parser = parse_mem_limit)]
    pub mem_limit: Option<u64>,

    /// File the sandbox writes usage statistics to
    #[arg(long, value_name = "PATH")]
    pub save_usage_stat: Option<String>,

    /// Working directory inside the sandbox
    #[arg(long, value_name = "DIR")]
    pub exec_dir: Option<String>,

    /// Path of the sandbox executable
    #[arg(long, value_name = "PATH", env = "SANDBOX_PATH")]
    pub sandbox_path: Option<PathBuf>,

    /// Kill the sandbox after this many seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the argument vector as JSON instead of running
    #[arg(long)]
    pub print_args: bool,

    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Program to run inside the sandbox, followed by its arguments
    #[arg(
        value_name = "PROGRAM",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Host path and sandbox path pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub src: String,
    pub dst: String,
}

fn parse_mapping(value: &str) -> Result<Mapping, String> {
    let (src, dst) = match value.split_once(':') {
        Some((src, dst)) => (src, dst),
        None => (value, value),
    };
    if src.is_empty() || dst.is_empty() {
        return Err(format!("expected SRC or SRC:DST, got {:?}", value));
    }
    Ok(Mapping {
        src: src.to_string(),
        dst: dst.to_string(),
    })
}

fn parse_mem_limit(value: &str) -> Result<u64, String> {
    parse_memory_size(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Build the sandbox: profile first, then flags on top. List flags append
    /// (files, ELF files, mounts, env), scalar flags overwrite.
    pub fn sandbox(&self) -> anyhow::Result<Sandbox> {
        let mut sandbox = match (&self.profile, &self.root) {
            (Some(path), root) => {
                let mut profile = SandboxProfile::load(path)?;
                if let Some(root) = root {
                    profile.root = root.clone();
                }
                profile.into_sandbox()?
            }
            (None, Some(root)) => Sandbox::new(root.as_str()),
            (None, None) => bail!("either --profile or --root is required"),
        };

        for file in &self.files {
            sandbox.add_file(file.src.as_str(), file.dst.as_str(), false);
        }
        for file in &self.elf_files {
            sandbox.add_file(file.src.as_str(), file.dst.as_str(), true);
        }
        for mount in &self.mounts {
            sandbox.mount_dir(mount.src.as_str(), mount.dst.as_str());
        }
        for entry in &self.env {
            sandbox.add_env(entry.as_str());
        }

        if let Some(no_new_net) = self.no_new_net {
            sandbox.set_no_new_net(no_new_net);
        }
        if let Some(cgroup) = &self.cgroup {
            sandbox.set_cgroup(cgroup.as_str());
        }
        if let Some(cpuset) = &self.cpuset {
            sandbox.set_cpuset(cpuset.as_str());
        }
        if let Some(limit) = self.mem_limit {
            sandbox.set_mem_limit(limit);
        }
        if let Some(path) = &self.save_usage_stat {
            sandbox.save_usage_stat(path.as_str());
        }
        if let Some(dir) = &self.exec_dir {
            sandbox.set_exec_dir(dir.as_str());
        }

        Ok(sandbox)
    }

    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::from_vec(&self.command)
    }

    /// Apply flag overrides on top of the environment-derived configuration
    pub fn launcher_config(&self, base: LauncherConfig) -> LauncherConfig {
        let mut config = base;
        if let Some(path) = &self.sandbox_path {
            config.sandbox_path = path.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config
    }
}

/// Full argv for `--print-args`: the sandbox executable followed by the
/// compiled arguments
pub fn print_argv(config: &LauncherConfig, sandbox: &Sandbox, spec: &CommandSpec) -> Vec<String> {
    let mut argv = vec![config.sandbox_path.display().to_string()];
    argv.extend(sandbox.compile(spec));
    argv
}

/// Process exit code of `sandbox-run` for the result of a run
pub fn exit_code(result: &crate::Result<RunOutcome>) -> i32 {
    match result {
        Ok(outcome) => {
            debug!("Sandbox exited with {:?}", outcome.status);
            outcome.status.exit_code()
        }
        Err(LaunchError::TimedOut { limit }) => {
            error!("Sandbox timed out after {:?}", limit);
            EXIT_TIMED_OUT
        }
        Err(LaunchError::Cancelled) => EXIT_CANCELLED,
        Err(e) => {
            error!("{}", e);
            EXIT_LAUNCH_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sandbox-run").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            parse_mapping("/bin/go:/usr/bin/go").unwrap(),
            Mapping {
                src: "/bin/go".into(),
                dst: "/usr/bin/go".into()
            }
        );
        assert_eq!(parse_mapping("/etc/hosts").unwrap().dst, "/etc/hosts");
        assert!(parse_mapping(":/x").is_err());
        assert!(parse_mapping("/x:").is_err());
    }

    #[test]
    fn test_flags_only() {
        let cli = parse(&[
            "--root",
            "/tmp/sb",
            "--elf-file",
            "/bin/go",
            "-e",
            "PATH=/usr/bin",
            "--no-new-net",
            "--mem-limit",
            "512M",
            "--",
            "go",
            "test",
            "./...",
        ]);

        let args = cli.sandbox().unwrap().compile(&cli.command_spec());
        assert_eq!(
            args,
            [
                "/tmp/sb",
                "--add_elf_file",
                "/bin/go",
                "/bin/go",
                "--env",
                "PATH=/usr/bin",
                "--no_new_net",
                "--mem_limit",
                "536870912",
                "--",
                "go",
                "test",
                "./...",
            ]
        );
    }

    #[test]
    fn test_program_args_with_hyphens() {
        let cli = parse(&["-r", "/x", "ls", "-la", "--color"]);
        assert_eq!(cli.command, ["ls", "-la", "--color"]);
    }

    #[test]
    fn test_root_or_profile_required() {
        let cli = parse(&["echo", "hi"]);
        assert!(cli.sandbox().is_err());
    }

    #[test]
    fn test_missing_program_rejected() {
        let result = Cli::try_parse_from(["sandbox-run", "--root", "/x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_layer_over_profile() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
root = "/from/profile"
env = ["A=1"]
cgroup = "profile-group"
mem_limit = 1024

[[files]]
src = "/bin/sh"
"#
        )
        .unwrap();
        let profile = file.path().to_string_lossy().into_owned();

        let cli = parse(&[
            "--profile",
            &profile,
            "--root",
            "/override",
            "--file",
            "/etc/passwd",
            "--env",
            "B=2",
            "--cgroup",
            "cli-group",
            "--",
            "sh",
        ]);
        let sandbox = cli.sandbox().unwrap();

        assert_eq!(sandbox.root(), "/override");
        assert_eq!(sandbox.files().len(), 2);
        assert_eq!(sandbox.files()[1].src, "/etc/passwd");
        assert_eq!(sandbox.env(), ["A=1", "B=2"]);
        assert_eq!(sandbox.cgroup(), Some("cli-group"));
        assert_eq!(sandbox.mem_limit(), Some(1024));
    }

    #[test]
    fn test_launcher_config_overrides() {
        let cli = parse(&[
            "--root",
            "/x",
            "--sandbox-path",
            "/opt/sandbox",
            "--timeout",
            "10",
            "true",
        ]);
        let config = cli.launcher_config(LauncherConfig::default());

        assert_eq!(config.sandbox_path, PathBuf::from("/opt/sandbox"));
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_no_new_net_forms() {
        assert_eq!(parse(&["-r", "/x", "true"]).no_new_net, None);
        assert_eq!(parse(&["-r", "/x", "--no-new-net", "true"]).no_new_net, Some(true));
        assert_eq!(
            parse(&["-r", "/x", "--no-new-net=false", "true"]).no_new_net,
            Some(false)
        );
    }

    #[test]
    fn test_no_new_net_can_clear_profile_setting() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "root = \"/x\"\nno_new_net = true").unwrap();
        let profile = file.path().to_string_lossy().into_owned();

        let kept = parse(&["--profile", &profile, "true"]).sandbox().unwrap();
        assert!(kept.no_new_net());

        let cleared = parse(&["--profile", &profile, "--no-new-net=false", "true"])
            .sandbox()
            .unwrap();
        assert!(!cleared.no_new_net());
        assert!(!cleared
            .build_exec_args("true", Vec::<String>::new())
            .iter()
            .any(|t| t == "--no_new_net"));
    }

    #[test]
    fn test_print_argv_starts_with_executable() {
        let cli = parse(&["-r", "/x", "--cgroup", "g", "--", "echo", "hi"]);
        let config = LauncherConfig::default().with_sandbox_path("/opt/sandbox");

        let argv = print_argv(&config, &cli.sandbox().unwrap(), &cli.command_spec());

        assert_eq!(argv, ["/opt/sandbox", "/x", "--cgroup", "g", "--", "echo", "hi"]);
        let json = serde_json::to_string(&argv).unwrap();
        assert_eq!(
            json,
            r#"["/opt/sandbox","/x","--cgroup","g","--","echo","hi"]"#
        );
    }

    fn outcome(status: RunStatus) -> crate::Result<RunOutcome> {
        Ok(RunOutcome {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(&outcome(RunStatus::Exited(0))), 0);
        assert_eq!(exit_code(&outcome(RunStatus::Exited(42))), 42);
        assert_eq!(exit_code(&outcome(RunStatus::Signaled(9))), 137);
        assert_eq!(
            exit_code(&Err(LaunchError::TimedOut {
                limit: Duration::from_secs(1)
            })),
            EXIT_TIMED_OUT
        );
        assert_eq!(exit_code(&Err(LaunchError::Cancelled)), EXIT_CANCELLED);
        assert_eq!(
            exit_code(&Err(LaunchError::Spawn {
                program: "/usr/bin/sandbox".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })),
            EXIT_LAUNCH_FAILED
        );
    }
}
