//! Git integration layer.
//!
//! All history queries and commit creation go through [`GitController`],
//! which drives the git executable as a child process. The runner seam
//! ([`GitRunner`]) lets callers substitute how invocations are executed.

mod controller;
mod error;
mod runner;

pub use controller::{GitController, LogFilter};
pub use error::GitError;
pub use runner::{GitRunner, Invocation, ProcessRunner, find_git};
