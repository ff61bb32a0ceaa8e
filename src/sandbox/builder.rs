//! Sandbox builder
//!
//! Accumulates the shape of a sandboxed execution. Nothing here is validated:
//! paths need not exist and limits need not be sane, the sandbox executable
//! owns all of that.

/// A host file exposed inside the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
    /// Path on the host
    pub src: String,
    /// Path inside the sandbox
    pub dst: String,
    /// Also expose the dynamic libraries the file links against
    pub with_libs: bool,
}

/// A host directory mounted inside the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirMount {
    pub src: String,
    pub dst: String,
}

/// Declarative description of how a program should run inside the sandbox.
///
/// Setters mutate in place and return `&mut Self`, so calls chain the same way
/// they do on [`std::process::Command`]. List setters append in call order,
/// scalar setters overwrite (last write wins).
///
/// ```
/// use sandbox_launcher::Sandbox;
///
/// let mut sandbox = Sandbox::new("/tmp/sb");
/// sandbox
///     .add_file("/bin/go", "/bin/go", true)
///     .add_env("PATH=/usr/bin")
///     .set_no_new_net(true)
///     .set_mem_limit(512 * 1024 * 1024);
///
/// let args = sandbox.build_exec_args("go", ["test", "./..."]);
/// assert_eq!(args.first().map(String::as_str), Some("/tmp/sb"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sandbox {
    root: String,
    files: Vec<FileMapping>,
    mount_dirs: Vec<DirMount>,
    env: Vec<String>,
    no_new_net: bool,
    cgroup: String,
    cpuset: String,
    mem_limit: u64,
    usage_stat_path: String,
    exec_dir: String,
}

impl Sandbox {
    /// Create an empty configuration for the given sandbox root
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Expose a host file at `dst`. With `with_libs` the file is treated as an
    /// ELF binary and its shared libraries come along.
    pub fn add_file(
        &mut self,
        src: impl Into<String>,
        dst: impl Into<String>,
        with_libs: bool,
    ) -> &mut Self {
        self.files.push(FileMapping {
            src: src.into(),
            dst: dst.into(),
            with_libs,
        });
        self
    }

    /// Mount a host directory at `dst`
    pub fn mount_dir(&mut self, src: impl Into<String>, dst: impl Into<String>) -> &mut Self {
        self.mount_dirs.push(DirMount {
            src: src.into(),
            dst: dst.into(),
        });
        self
    }

    /// Add a raw `KEY=VALUE` environment entry
    pub fn add_env(&mut self, entry: impl Into<String>) -> &mut Self {
        self.env.push(entry.into());
        self
    }

    /// Isolate the process from the network
    pub fn set_no_new_net(&mut self, value: bool) -> &mut Self {
        self.no_new_net = value;
        self
    }

    /// Place the process in the named control group. Empty clears it.
    pub fn set_cgroup(&mut self, name: impl Into<String>) -> &mut Self {
        self.cgroup = name.into();
        self
    }

    /// Restrict the CPUs the process may use. Empty clears it.
    pub fn set_cpuset(&mut self, set: impl Into<String>) -> &mut Self {
        self.cpuset = set.into();
        self
    }

    /// Memory limit in bytes. Zero clears it.
    pub fn set_mem_limit(&mut self, bytes: u64) -> &mut Self {
        self.mem_limit = bytes;
        self
    }

    /// Ask the sandbox to write usage statistics to `path` once the process exits
    pub fn save_usage_stat(&mut self, path: impl Into<String>) -> &mut Self {
        self.usage_stat_path = path.into();
        self
    }

    /// Working directory inside the sandbox
    pub fn set_exec_dir(&mut self, dir: impl Into<String>) -> &mut Self {
        self.exec_dir = dir.into();
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn files(&self) -> &[FileMapping] {
        &self.files
    }

    pub fn mount_dirs(&self) -> &[DirMount] {
        &self.mount_dirs
    }

    pub fn env(&self) -> &[String] {
        &self.env
    }

    pub fn no_new_net(&self) -> bool {
        self.no_new_net
    }

    pub fn cgroup(&self) -> Option<&str> {
        non_empty(&self.cgroup)
    }

    pub fn cpuset(&self) -> Option<&str> {
        non_empty(&self.cpuset)
    }

    pub fn mem_limit(&self) -> Option<u64> {
        (self.mem_limit != 0).then_some(self.mem_limit)
    }

    pub fn usage_stat_path(&self) -> Option<&str> {
        non_empty(&self.usage_stat_path)
    }

    pub fn exec_dir(&self) -> Option<&str> {
        non_empty(&self.exec_dir)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unconfigured() {
        let sandbox = Sandbox::new("/x");

        assert_eq!(sandbox.root(), "/x");
        assert!(sandbox.files().is_empty());
        assert!(sandbox.mount_dirs().is_empty());
        assert!(sandbox.env().is_empty());
        assert!(!sandbox.no_new_net());
        assert_eq!(sandbox.cgroup(), None);
        assert_eq!(sandbox.cpuset(), None);
        assert_eq!(sandbox.mem_limit(), None);
        assert_eq!(sandbox.usage_stat_path(), None);
        assert_eq!(sandbox.exec_dir(), None);
    }

    #[test]
    fn test_scalar_setters_last_write_wins() {
        let mut sandbox = Sandbox::new("/x");
        sandbox
            .set_cgroup("first")
            .set_mem_limit(1024)
            .set_cpuset("0")
            .set_cgroup("second")
            .set_no_new_net(true)
            .set_exec_dir("/a")
            .set_mem_limit(2048)
            .save_usage_stat("/tmp/one")
            .set_no_new_net(false)
            .set_exec_dir("/b")
            .set_cpuset("1-3")
            .save_usage_stat("/tmp/two");

        assert_eq!(sandbox.cgroup(), Some("second"));
        assert_eq!(sandbox.cpuset(), Some("1-3"));
        assert_eq!(sandbox.mem_limit(), Some(2048));
        assert_eq!(sandbox.usage_stat_path(), Some("/tmp/two"));
        assert_eq!(sandbox.exec_dir(), Some("/b"));
        assert!(!sandbox.no_new_net());
    }

    #[test]
    fn test_default_values_clear_scalars() {
        let mut sandbox = Sandbox::new("/x");
        sandbox.set_cgroup("g").set_mem_limit(10).set_exec_dir("/w");
        sandbox.set_cgroup("").set_mem_limit(0).set_exec_dir("");

        assert_eq!(sandbox.cgroup(), None);
        assert_eq!(sandbox.mem_limit(), None);
        assert_eq!(sandbox.exec_dir(), None);
    }

    #[test]
    fn test_lists_keep_insertion_order_and_duplicates() {
        let mut sandbox = Sandbox::new("/x");
        sandbox
            .add_file("/a", "/dup", false)
            .add_env("B=2")
            .mount_dir("/m1", "/mnt")
            .add_file("/b", "/dup", true)
            .add_env("A=1")
            .add_env("B=2")
            .mount_dir("/m2", "/mnt");

        let srcs: Vec<_> = sandbox.files().iter().map(|f| f.src.as_str()).collect();
        assert_eq!(srcs, ["/a", "/b"]);
        assert!(sandbox.files()[1].with_libs);
        assert_eq!(sandbox.env(), ["B=2", "A=1", "B=2"]);
        assert_eq!(sandbox.mount_dirs()[1].src, "/m2");
    }
}
