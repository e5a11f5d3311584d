use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::load_config;
use crate::sync::build_jobs;

/// CLI command: print the configured sources.
///
/// Each source is displayed with its kind, the username it follows and the
/// commit message that marks its commits:
/// ```text
/// - LeetCode [problem-judge] alice: "LeetCode activity"
/// - work reviews [review-system] jdoe: "work reviews activity"
/// ```
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or a source is invalid.
pub fn cmd_list(config: Option<&Path>) -> Result<()> {
    let cfg = load_config(config)?;
    println!("repository: {}", cfg.repo.path.display());
    for job in build_jobs(&cfg)? {
        println!(
            "- {} [{}] {}: {:?}",
            job.display.bold(),
            job.source.kind().to_string().cyan(),
            job.plan.username,
            job.plan.message
        );
    }
    Ok(())
}
