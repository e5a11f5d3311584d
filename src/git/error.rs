//! Errors raised by the repository controller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while driving the git executable.
#[derive(Error, Debug)]
pub enum GitError {
    /// `path` is not the top-level directory of a git repository.
    #[error("{} is not a root of a git repository", path.display())]
    NotAGitRepository { path: PathBuf },

    /// An operation ran before the controller was ready for it.
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),

    /// git exited with a non-zero status.
    #[error("git {args} failed ({}): {}", exit_label(*code), stderr.trim())]
    NonZeroExit {
        args: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("git executable not found in PATH")]
    GitNotFound,

    #[error("failed to spawn git in {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected output from git {args}: {output:?}")]
    UnexpectedOutput { args: String, output: String },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

impl GitError {
    /// Exit code of a failed git invocation, if that is what this error is.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GitError::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }
}
