use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::{Config, SourceConfig};
use crate::git::LogFilter;
use crate::source::ActivitySource;

/// How commits for one source are written and recognized again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub username: String,
    pub message: String,
    /// Selects this source's commits when computing the cursor.
    pub filter: LogFilter,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl CommitPlan {
    /// Environment overrides stamping a commit with `ts` as both author and
    /// committer date, plus the configured identity.
    pub fn commit_env(&self, ts: DateTime<Utc>) -> Vec<(String, String)> {
        let date = format!("@{} +0000", ts.timestamp());
        let mut env = vec![
            ("GIT_AUTHOR_DATE".to_string(), date.clone()),
            ("GIT_COMMITTER_DATE".to_string(), date),
        ];
        if let Some(name) = &self.author_name {
            env.push(("GIT_AUTHOR_NAME".to_string(), name.clone()));
            env.push(("GIT_COMMITTER_NAME".to_string(), name.clone()));
        }
        if let Some(email) = &self.author_email {
            env.push(("GIT_AUTHOR_EMAIL".to_string(), email.clone()));
            env.push(("GIT_COMMITTER_EMAIL".to_string(), email.clone()));
        }
        env
    }
}

/// One configured source ready to be synchronized.
pub struct SyncJob {
    pub display: String,
    pub source: ActivitySource,
    pub plan: CommitPlan,
}

/// Build synchronization jobs from the parsed configuration, in file order.
///
/// # Errors
/// Fails if a source cannot be constructed (e.g. a missing instance URL).
pub fn build_jobs(cfg: &Config) -> Result<Vec<SyncJob>> {
    cfg.sources.iter().map(build_job).collect()
}

fn build_job(sc: &SourceConfig) -> Result<SyncJob> {
    let source = ActivitySource::new(sc.kind, sc.instance.clone())?;
    let display = sc.name.clone().unwrap_or_else(|| source.to_string());
    let message = sc.message.clone().unwrap_or_else(|| default_message(sc));

    let mut filter = LogFilter::default().message(format!("^{}$", escape_bre(&message)));
    if let Some(who) = sc.author_email.as_deref().or(sc.author_name.as_deref()) {
        filter = filter.author(escape_bre(who));
    }

    Ok(SyncJob {
        display,
        source,
        plan: CommitPlan {
            username: sc.username.clone(),
            message,
            filter,
            author_name: sc.author_name.clone(),
            author_email: sc.author_email.clone(),
        },
    })
}

/// `"<Platform> activity"`, qualified so that two sources of the same kind
/// never share a cursor.
fn default_message(sc: &SourceConfig) -> String {
    let platform = sc.kind.platform();
    match (&sc.name, &sc.instance) {
        (Some(name), _) => format!("{name} activity"),
        (None, Some(instance)) => format!("{platform} activity on {instance}"),
        (None, None) => format!("{platform} activity"),
    }
}

/// Escape the characters that are special in a git (POSIX basic) regex.
pub fn escape_bre(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '.' | '[' | '*' | '^' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
