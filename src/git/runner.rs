use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::error::GitError;

/// One git invocation: executable, working directory, arguments and the
/// environment overrides layered over the ambient process environment.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub program: &'a Path,
    pub cwd: &'a Path,
    pub args: &'a [String],
    pub env: &'a [(String, String)],
}

impl Invocation<'_> {
    /// Arguments joined for diagnostics.
    pub fn display_args(&self) -> String {
        self.args.join(" ")
    }
}

/// Executes git invocations.
///
/// The controller funnels every operation through a runner, so swapping the
/// runner is enough to observe or script git without touching a real
/// repository.
pub trait GitRunner {
    /// Run the invocation and return its standard output.
    ///
    /// # Errors
    /// - [`GitError::Spawn`] if the process cannot be started.
    /// - [`GitError::NonZeroExit`] if it exits with a non-zero status.
    fn run(&self, invocation: &Invocation<'_>) -> Result<String, GitError>;
}

/// Runs git as a child process via [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl GitRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation<'_>) -> Result<String, GitError> {
        let output = Command::new(invocation.program)
            .args(invocation.args)
            .current_dir(invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Spawn {
                path: invocation.cwd.to_path_buf(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            Err(GitError::NonZeroExit {
                args: invocation.display_args(),
                code: output.status.code(),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Locate the git executable on `PATH`.
///
/// # Errors
/// Returns [`GitError::GitNotFound`] if no `PATH` entry contains git.
pub fn find_git() -> Result<PathBuf, GitError> {
    let name = if cfg!(windows) { "git.exe" } else { "git" };
    find_in_path(name).ok_or(GitError::GitNotFound)
}

fn find_in_path(bin: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
