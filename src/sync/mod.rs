mod jobs;
mod progress;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing::info;

use crate::config::{RepoConfig, load_config};
use crate::cursor::LastSynced;
use crate::git::{GitController, GitRunner};
use crate::source::{ActivityCalendar, newer_than, separate_collisions};

pub use jobs::{CommitPlan, SyncJob, build_jobs, escape_bre};

/// Outcome of synchronizing one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Cursor found in history before this run.
    pub cursor: LastSynced,
    pub created: usize,
}

/// Create one empty commit per activity of `plan.username` newer than
/// `cursor`, oldest first, each dated at its activity timestamp.
///
/// Equal timestamps are pushed apart by whole seconds so that every commit
/// of the run carries a distinct author date. The first failing commit
/// aborts the run; commits made before it stay in history.
///
/// Returns the number of commits created.
pub fn synchronize<R: GitRunner>(
    git: &GitController<R>,
    source: &dyn ActivityCalendar,
    plan: &CommitPlan,
    cursor: LastSynced,
) -> Result<usize> {
    let stamps = pending(source, plan, cursor)?;
    commit_merged(git, &[(plan, stamps)])
}

/// Compute the cursor from history, then [`synchronize`] from it.
pub fn sync_source<R: GitRunner>(
    git: &GitController<R>,
    source: &dyn ActivityCalendar,
    plan: &CommitPlan,
) -> Result<SyncReport> {
    let cursor = git.last_author_date(&plan.filter)?;
    let created = synchronize(git, source, plan, cursor)?;
    Ok(SyncReport { cursor, created })
}

/// Timestamps that would be committed for `plan` after `cursor`.
pub fn pending(
    source: &dyn ActivityCalendar,
    plan: &CommitPlan,
    cursor: LastSynced,
) -> Result<Vec<DateTime<Utc>>> {
    let stamps = source.get_calendar(&plan.username, cursor)?;
    Ok(separate_collisions(newer_than(stamps, cursor)))
}

/// Commit several sources' pending timestamps as one timeline.
///
/// Each batch pairs a plan with timestamps from [`pending`]. All of them
/// are committed in ascending order, so author dates never go backwards
/// across the run; ties keep batch order. Each batch is itself ascending,
/// so every source's cursor still ends at its own latest commit.
///
/// Returns the number of commits created.
pub fn commit_merged<R: GitRunner>(
    git: &GitController<R>,
    batches: &[(&CommitPlan, Vec<DateTime<Utc>>)],
) -> Result<usize> {
    let mut timeline: Vec<(DateTime<Utc>, &CommitPlan)> = batches
        .iter()
        .flat_map(|(plan, stamps)| stamps.iter().map(move |ts| (*ts, *plan)))
        .collect();
    timeline.sort_by_key(|(ts, _)| *ts);

    for (ts, plan) in &timeline {
        git.commit(&plan.message, true, &plan.commit_env(*ts))
            .with_context(|| format!("failed to commit {:?} at {}", plan.message, fmt_ts(ts)))?;
    }
    Ok(timeline.len())
}

/// Cursor of `plan` in `git`; a repository that does not exist yet has
/// never been synced.
pub fn cursor_of<R: GitRunner>(git: &GitController<R>, plan: &CommitPlan) -> Result<LastSynced> {
    if !git.is_initialized() {
        return Ok(LastSynced::Never);
    }
    Ok(git.last_author_date(&plan.filter)?)
}

/// Open the configured repository, initializing it when allowed.
///
/// With `read_only` nothing is written: an uninitialized directory is left
/// alone and the user identity is not configured.
pub fn prepare_repo(repo: &RepoConfig, read_only: bool) -> Result<GitController> {
    if repo.init && !read_only {
        fs::create_dir_all(&repo.path)
            .with_context(|| format!("failed to create {}", repo.path.display()))?;
    }
    let mut git = GitController::open(&repo.path, repo.init)?;
    if read_only {
        return Ok(git);
    }
    if !git.is_initialized() {
        info!(path = %repo.path.display(), "initializing repository");
        git.init()?;
    }
    git.config_user(repo.user_name.as_deref(), repo.user_email.as_deref())?;
    Ok(git)
}

/// Synchronize every source in the configuration.
///
/// High-level flow:
/// 1. Load the configuration and open (or initialize) the repository.
/// 2. For each source, in order: compute its cursor from history and fetch
///    the activity newer than it.
/// 3. Commit everything fetched as one ascending timeline.
/// 4. Push once if configured and anything was committed.
///
/// Sources are fetched one after another with a spinner each. The first
/// error stops the run. With `dry_run` the pending timestamps are printed
/// instead of committed.
pub fn cmd_sync(config: Option<&Path>, dry_run: bool) -> Result<()> {
    let cfg = load_config(config)?;
    if cfg.sources.is_empty() {
        eprintln!("no sources configured");
        return Ok(());
    }

    let jobs = build_jobs(&cfg)?;
    let git = prepare_repo(&cfg.repo, dry_run)?;
    let quiet = !io::stderr().is_terminal();

    let mut batches = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let pb = progress::start(format!("fetching {}", job.display), quiet);
        let res: Result<(LastSynced, Vec<DateTime<Utc>>)> = (|| {
            let cursor = cursor_of(&git, &job.plan)?;
            Ok((cursor, pending(&job.source, &job.plan, cursor)?))
        })();

        match res {
            Ok((cursor, stamps)) => {
                info!(source = %job.display, %cursor, pending = stamps.len(), "source fetched");
                progress::succeed(&pb, format!("{}: {} pending (since {})", job.display, stamps.len(), cursor));
                batches.push((&job.plan, stamps));
            }
            Err(e) => {
                progress::fail(&pb, format!("fetching {} (error: {:#})", job.display, e));
                return Err(e.context(format!("failed to sync {}", job.display)));
            }
        }
    }

    if dry_run {
        for (job, (_, stamps)) in jobs.iter().zip(&batches) {
            for ts in stamps {
                println!("{}\t{}", job.display, fmt_ts(ts));
            }
        }
        return Ok(());
    }

    let total: usize = batches.iter().map(|(_, stamps)| stamps.len()).sum();
    if total == 0 {
        return Ok(());
    }

    let pb = progress::start(format!("committing {total} activities"), quiet);
    match commit_merged(&git, &batches) {
        Ok(n) => progress::succeed(&pb, format!("{n} new commits")),
        Err(e) => {
            progress::fail(&pb, format!("committing (error: {e:#})"));
            return Err(e);
        }
    }

    if cfg.repo.push {
        info!(repo = %git.repo_path().display(), total, "pushing");
        let pb = progress::start("pushing".to_string(), quiet);
        match git.push() {
            Ok(()) => progress::succeed(&pb, format!("pushed {total} commits")),
            Err(e) => {
                progress::fail(&pb, format!("push failed (error: {e})"));
                return Err(e.into());
            }
        }
    }
    Ok(())
}

/// Print each configured source's cursor.
pub fn cmd_cursor(config: Option<&Path>) -> Result<()> {
    let cfg = load_config(config)?;
    let jobs = build_jobs(&cfg)?;
    let git = prepare_repo(&cfg.repo, true)?;
    for job in &jobs {
        println!("{}\t{}", job.display, cursor_of(&git, &job.plan)?);
    }
    Ok(())
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
