//! Argument rendering
//!
//! Turns a [`Sandbox`] plus a target command into the argument vector of the
//! sandbox executable. The order and spelling of every flag is what the
//! executable's parser expects; changing either breaks compatibility.

use super::builder::Sandbox;
use crate::runner::CommandSpec;

/// Ordered argument vector handed to the sandbox executable
pub type CompiledArgs = Vec<String>;

pub const FLAG_ADD_FILE: &str = "--add_file";
pub const FLAG_ADD_ELF_FILE: &str = "--add_elf_file";
pub const FLAG_MOUNT_DIR: &str = "--mount_dir";
pub const FLAG_ENV: &str = "--env";
pub const FLAG_NO_NEW_NET: &str = "--no_new_net";
pub const FLAG_CGROUP: &str = "--cgroup";
pub const FLAG_CPUSET: &str = "--cpuset";
pub const FLAG_MEM_LIMIT: &str = "--mem_limit";
pub const FLAG_SAVE_USAGE_STAT: &str = "--save_usage_stat";
pub const FLAG_EXEC_DIR: &str = "--exec_dir";
/// Separates sandbox options from the sandboxed command
pub const SEPARATOR: &str = "--";

impl Sandbox {
    /// Render the argument vector for running `program` with `args` inside
    /// this sandbox. Unset options are skipped.
    pub fn build_exec_args<I, S>(&self, program: &str, args: I) -> CompiledArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exec_args = vec![self.root().to_string()];

        for file in self.files() {
            let flag = if file.with_libs {
                FLAG_ADD_ELF_FILE
            } else {
                FLAG_ADD_FILE
            };
            exec_args.extend([flag.to_string(), file.src.clone(), file.dst.clone()]);
        }

        for dir in self.mount_dirs() {
            exec_args.extend([FLAG_MOUNT_DIR.to_string(), dir.src.clone(), dir.dst.clone()]);
        }

        for entry in self.env() {
            exec_args.extend([FLAG_ENV.to_string(), entry.clone()]);
        }

        if self.no_new_net() {
            exec_args.push(FLAG_NO_NEW_NET.to_string());
        }

        let options = [
            (FLAG_CGROUP, self.cgroup().map(str::to_string)),
            (FLAG_CPUSET, self.cpuset().map(str::to_string)),
            (FLAG_MEM_LIMIT, self.mem_limit().map(|bytes| bytes.to_string())),
            (FLAG_SAVE_USAGE_STAT, self.usage_stat_path().map(str::to_string)),
            (FLAG_EXEC_DIR, self.exec_dir().map(str::to_string)),
        ];
        for (flag, value) in options {
            if let Some(value) = value {
                exec_args.extend([flag.to_string(), value]);
            }
        }

        exec_args.push(SEPARATOR.to_string());
        exec_args.push(program.to_string());
        exec_args.extend(args.into_iter().map(|a| a.as_ref().to_string()));
        exec_args
    }

    /// Same as [`Sandbox::build_exec_args`], taking the command as a [`CommandSpec`]
    pub fn compile(&self, cmd: &CommandSpec) -> CompiledArgs {
        self.build_exec_args(&cmd.program, &cmd.args)
    }
}
