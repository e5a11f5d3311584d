//! Crate entry point for **calsync**.
//!
//! calsync mirrors activity from external platforms (online judges, code
//! hosting, wikis, code review) into a git repository as one empty commit per
//! activity, dated at the activity's timestamp. Git history itself records
//! how far each source has been synchronized.
//!
//! - [`git`] drives the git executable.
//! - [`source`] fetches activity timestamps per platform.
//! - [`sync`] ties the two together.

mod config;
mod cursor;
pub mod git;
mod list;
mod paths;
pub mod source;
pub mod sync;

pub use config::{Config, RepoConfig, SourceConfig, load_config, parse_config};
pub use cursor::LastSynced;
pub use list::cmd_list;
pub use paths::calsync_home;
pub use sync::{cmd_cursor, cmd_sync};
