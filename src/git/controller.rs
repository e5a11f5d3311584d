use chrono::DateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::GitError;
use super::runner::{GitRunner, Invocation, ProcessRunner, find_git};
use crate::cursor::LastSynced;

/// Optional narrowing of the commits considered by [`GitController::last_author_date`].
///
/// Each pattern is handed to git unchanged (`--author`, `--committer`,
/// `--grep`), so native git matching applies: patterns are regular
/// expressions and unanchored ones match anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub author: Option<String>,
    pub committer: Option<String>,
    pub message: Option<String>,
}

impl LogFilter {
    pub fn author(mut self, pattern: impl Into<String>) -> Self {
        self.author = Some(pattern.into());
        self
    }

    pub fn committer(mut self, pattern: impl Into<String>) -> Self {
        self.committer = Some(pattern.into());
        self
    }

    pub fn message(mut self, pattern: impl Into<String>) -> Self {
        self.message = Some(pattern.into());
        self
    }

    fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(a) = &self.author {
            args.extend(["--author".to_string(), a.clone()]);
        }
        if let Some(c) = &self.committer {
            args.extend(["--committer".to_string(), c.clone()]);
        }
        if let Some(m) = &self.message {
            args.extend(["--grep".to_string(), m.clone()]);
        }
        args
    }
}

/// Command-execution façade over a single git working directory.
///
/// Every operation builds an argument list and hands it to [`GitController::exec`],
/// which is the only place exit codes are interpreted.
pub struct GitController<R: GitRunner = ProcessRunner> {
    repo_path: PathBuf,
    git_path: Option<PathBuf>,
    initialized: bool,
    runner: R,
}

impl GitController<ProcessRunner> {
    /// Open the repository rooted at `repo_path` using the git found on `PATH`.
    ///
    /// # Errors
    /// - [`GitError::GitNotFound`] if git is not installed.
    /// - [`GitError::NotAGitRepository`] if `repo_path` is missing or not a
    ///   repository (and `allow_not_initialized` is false), or if it sits
    ///   inside a repository without being its top-level directory.
    pub fn open(repo_path: impl Into<PathBuf>, allow_not_initialized: bool) -> Result<Self, GitError> {
        Self::open_with(repo_path, allow_not_initialized, ProcessRunner)
    }
}

impl<R: GitRunner> GitController<R> {
    /// Like [`GitController::open`], executing git through `runner`.
    pub fn open_with(
        repo_path: impl Into<PathBuf>,
        allow_not_initialized: bool,
        runner: R,
    ) -> Result<Self, GitError> {
        let mut controller = Self {
            repo_path: repo_path.into(),
            git_path: None,
            initialized: false,
            runner,
        };
        debug!(repo = %controller.repo_path.display(), "opening repository");
        controller.prepare(allow_not_initialized)?;
        Ok(controller)
    }

    fn prepare(&mut self, allow_not_initialized: bool) -> Result<(), GitError> {
        let git = find_git()?;
        debug!(git = %git.display(), "resolved git executable");
        self.git_path = Some(git);

        if !self.repo_path.is_dir() {
            debug!(repo = %self.repo_path.display(), "repository directory does not exist");
            if allow_not_initialized {
                return Ok(());
            }
            return Err(GitError::NotAGitRepository {
                path: self.repo_path.clone(),
            });
        }

        match self.top_level() {
            Ok(top) => {
                if !same_dir(&top, &self.repo_path) {
                    debug!(toplevel = %top.display(), "repository root differs from path");
                    return Err(GitError::NotAGitRepository {
                        path: self.repo_path.clone(),
                    });
                }
                self.initialized = true;
            }
            Err(GitError::NonZeroExit { .. }) if allow_not_initialized => {}
            Err(GitError::NonZeroExit { .. }) => {
                return Err(GitError::NotAGitRepository {
                    path: self.repo_path.clone(),
                });
            }
            Err(e) => return Err(e),
        }
        debug!(initialized = self.initialized, "repository prepared");
        Ok(())
    }

    fn top_level(&self) -> Result<PathBuf, GitError> {
        let raw = self.exec(&["rev-parse", "--show-toplevel"], &[])?;
        Ok(PathBuf::from(raw.trim()))
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn git_path(&self) -> Option<&Path> {
        self.git_path.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run `git init` in the repository directory.
    pub fn init(&mut self) -> Result<(), GitError> {
        self.require_git()?;
        self.exec(&["init"], &[])?;
        self.initialized = true;
        Ok(())
    }

    /// Set `user.name` and/or `user.email`; omitted values are left alone.
    pub fn config_user(&self, name: Option<&str>, email: Option<&str>) -> Result<(), GitError> {
        self.require_git()?;
        if let Some(name) = name {
            self.exec(&["config", "user.name", name], &[])?;
        }
        if let Some(email) = email {
            self.exec(&["config", "user.email", email], &[])?;
        }
        Ok(())
    }

    /// Author date of the most recent commit reachable from `HEAD` that
    /// matches `filter`, or [`LastSynced::Never`] when nothing matches.
    ///
    /// Matching commits are counted first so that an empty result never has
    /// to be parsed as a date.
    pub fn last_author_date(&self, filter: &LogFilter) -> Result<LastSynced, GitError> {
        self.require_initialized()?;
        if !self.has_head()? {
            return Ok(LastSynced::Never);
        }

        let filter_args = filter.to_args();

        let mut count_args = vec!["rev-list".to_string(), "--count".to_string(), "HEAD".to_string()];
        count_args.extend(filter_args.iter().cloned());
        let raw = self.exec(&count_args, &[])?;
        let count: u64 = raw.trim().parse().map_err(|_| GitError::UnexpectedOutput {
            args: count_args.join(" "),
            output: raw.clone(),
        })?;
        debug!(count, ?filter, "matching commits");
        if count == 0 {
            return Ok(LastSynced::Never);
        }

        // %at is the author date; %ct would be the committer date.
        let mut log_args = vec!["log".to_string(), "-1".to_string(), "--format=%at".to_string()];
        log_args.extend(filter_args);
        let raw = self.exec(&log_args, &[])?;
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(LastSynced::At)
            .ok_or_else(|| GitError::UnexpectedOutput {
                args: log_args.join(" "),
                output: raw.clone(),
            })
    }

    /// `HEAD` resolves to a commit. `rev-parse --verify --quiet` exits 1 on
    /// an unborn branch.
    fn has_head(&self) -> Result<bool, GitError> {
        match self.exec(&["rev-parse", "--verify", "--quiet", "HEAD^{commit}"], &[]) {
            Ok(_) => Ok(true),
            Err(e) if e.exit_code() == Some(1) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a commit with `message`.
    ///
    /// `env` carries the `GIT_AUTHOR_*` / `GIT_COMMITTER_*` overrides; without
    /// date overrides git stamps the current time.
    pub fn commit(
        &self,
        message: &str,
        allow_empty: bool,
        env: &[(String, String)],
    ) -> Result<(), GitError> {
        self.require_initialized()?;
        let mut args = vec!["commit", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.exec(&args, env)?;
        Ok(())
    }

    /// Push the current branch to its configured upstream.
    pub fn push(&self) -> Result<(), GitError> {
        self.require_initialized()?;
        debug!(repo = %self.repo_path().display(), "pushing");
        self.exec(&["push"], &[])?;
        Ok(())
    }

    /// Run git with `args` in the repository directory and return stdout.
    ///
    /// # Errors
    /// - [`GitError::PreconditionViolation`] if no git executable was resolved.
    /// - [`GitError::NonZeroExit`] on any non-zero exit status.
    pub fn exec<S: AsRef<str>>(
        &self,
        args: &[S],
        additional_env: &[(String, String)],
    ) -> Result<String, GitError> {
        let program = self.require_git()?;
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.runner.run(&Invocation {
            program,
            cwd: &self.repo_path,
            args: &args,
            env: additional_env,
        })
    }

    fn require_git(&self) -> Result<&Path, GitError> {
        self.git_path
            .as_deref()
            .ok_or(GitError::PreconditionViolation("git executable has not been resolved"))
    }

    fn require_initialized(&self) -> Result<(), GitError> {
        if self.initialized {
            Ok(())
        } else {
            Err(GitError::PreconditionViolation("repository is not initialized"))
        }
    }
}

/// Compare two directories by their resolved real paths.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
