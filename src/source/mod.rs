//! Activity sources.
//!
//! A source turns a username into the timestamps of that user's activity on
//! an external platform. The set of platforms is closed: [`SourceKind`] names
//! each one and [`ActivitySource`] dispatches to its client.

mod calendar;
mod gerrit;
mod gitlab;
mod leetcode;
mod mediawiki;

use anyhow::{Result, bail};
use chrono::{DateTime, SubsecRound, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::cursor::LastSynced;

pub use calendar::{expand_day_counts, separate_collisions};

/// Kind of external platform an activity source talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Online judge submissions (LeetCode).
    #[serde(alias = "leetcode")]
    ProblemJudge,
    /// Code-hosting contribution calendar (GitLab).
    #[serde(alias = "gitlab")]
    CodeHosting,
    /// Wiki edits (MediaWiki).
    #[serde(alias = "mediawiki")]
    Wiki,
    /// Code reviews (Gerrit).
    #[serde(alias = "gerrit")]
    ReviewSystem,
}

impl SourceKind {
    /// Name of the platform backing this kind.
    pub fn platform(self) -> &'static str {
        match self {
            SourceKind::ProblemJudge => "LeetCode",
            SourceKind::CodeHosting => "GitLab",
            SourceKind::Wiki => "MediaWiki",
            SourceKind::ReviewSystem => "Gerrit",
        }
    }

    /// Instance used when none is configured.
    fn default_instance(self) -> Option<&'static str> {
        match self {
            SourceKind::ProblemJudge => Some("https://leetcode.com"),
            SourceKind::CodeHosting => Some("https://gitlab.com"),
            SourceKind::Wiki => Some("https://en.wikipedia.org/w/api.php"),
            SourceKind::ReviewSystem => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::ProblemJudge => "problem-judge",
            SourceKind::CodeHosting => "code-hosting",
            SourceKind::Wiki => "wiki",
            SourceKind::ReviewSystem => "review-system",
        })
    }
}

/// Anything that can list a user's activity newer than a cursor.
pub trait ActivityCalendar {
    /// Timestamps of `username`'s activity strictly after `later_than`,
    /// in ascending order.
    fn get_calendar(&self, username: &str, later_than: LastSynced) -> Result<Vec<DateTime<Utc>>>;
}

/// A configured activity source: a platform kind plus an optional instance URL.
pub struct ActivitySource {
    kind: SourceKind,
    instance: Option<String>,
    client: Client,
}

impl ActivitySource {
    /// Build a source for `kind`, optionally pointed at a self-hosted `instance`.
    ///
    /// # Errors
    /// Fails if the kind has no public default and no instance was given, or
    /// if the HTTP client cannot be built.
    pub fn new(kind: SourceKind, instance: Option<String>) -> Result<Self> {
        if instance.is_none() && kind.default_instance().is_none() {
            bail!("{} source requires an instance URL", kind.platform());
        }
        Ok(Self {
            kind,
            instance,
            client: http_client()?,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    fn base_url(&self) -> &str {
        self.instance
            .as_deref()
            .or(self.kind.default_instance())
            .unwrap_or_default()
            .trim_end_matches('/')
    }

    fn fetch(&self, username: &str, later_than: LastSynced) -> Result<Vec<DateTime<Utc>>> {
        let base = self.base_url();
        match self.kind {
            SourceKind::ProblemJudge => leetcode::fetch(&self.client, base, username),
            SourceKind::CodeHosting => gitlab::fetch(&self.client, base, username),
            SourceKind::Wiki => mediawiki::fetch(&self.client, base, username, later_than),
            SourceKind::ReviewSystem => gerrit::fetch(&self.client, base, username, later_than),
        }
    }
}

impl ActivityCalendar for ActivitySource {
    fn get_calendar(&self, username: &str, later_than: LastSynced) -> Result<Vec<DateTime<Utc>>> {
        let raw = self.fetch(username, later_than)?;
        let total = raw.len();
        let calendar = newer_than(raw, later_than);
        debug!(source = %self, total, newer = calendar.len(), "fetched calendar");
        Ok(calendar)
    }
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}(instance={:?})", self.kind.platform(), instance),
            None => f.write_str(self.kind.platform()),
        }
    }
}

/// Truncate to whole seconds, sort ascending and keep only timestamps
/// strictly after `later_than`.
///
/// Commit dates carry whole seconds only, so the cursor read back from
/// history never has a fractional part. Comparing untruncated timestamps
/// against it would report the same activity as new on every run.
pub fn newer_than(stamps: Vec<DateTime<Utc>>, later_than: LastSynced) -> Vec<DateTime<Utc>> {
    let mut stamps: Vec<DateTime<Utc>> = stamps
        .into_iter()
        .map(|t| t.trunc_subsecs(0))
        .filter(|t| later_than.is_before(t))
        .collect();
    stamps.sort();
    stamps
}

fn http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("calsync/", env!("CARGO_PKG_VERSION"))),
    );
    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn kind_parses_generic_and_platform_names() {
        #[derive(Deserialize)]
        struct Row {
            kind: SourceKind,
        }
        for (txt, want) in [
            ("problem-judge", SourceKind::ProblemJudge),
            ("leetcode", SourceKind::ProblemJudge),
            ("code-hosting", SourceKind::CodeHosting),
            ("gitlab", SourceKind::CodeHosting),
            ("wiki", SourceKind::Wiki),
            ("mediawiki", SourceKind::Wiki),
            ("review-system", SourceKind::ReviewSystem),
            ("gerrit", SourceKind::ReviewSystem),
        ] {
            let row: Row = toml::from_str(&format!("kind = {txt:?}")).unwrap();
            assert_eq!(row.kind, want, "{txt}");
        }
    }

    #[test]
    fn display_names_platform_and_instance() {
        let s = ActivitySource::new(SourceKind::CodeHosting, Some("https://git.example.org".into()))
            .unwrap();
        assert_eq!(s.to_string(), r#"GitLab(instance="https://git.example.org")"#);
        assert_eq!(s.instance(), Some("https://git.example.org"));
        assert_eq!(s.kind(), SourceKind::CodeHosting);

        let s = ActivitySource::new(SourceKind::ProblemJudge, None).unwrap();
        assert_eq!(s.to_string(), "LeetCode");
        assert_eq!(s.base_url(), "https://leetcode.com");
    }

    #[test]
    fn review_system_requires_instance() {
        assert!(ActivitySource::new(SourceKind::ReviewSystem, None).is_err());
        assert!(ActivitySource::new(SourceKind::ReviewSystem, Some("https://r.example".into())).is_ok());
    }

    #[test]
    fn newer_than_sorts_and_filters_strictly() {
        let got = newer_than(vec![at(30), at(10), at(20), at(5)], LastSynced::At(at(10)));
        assert_eq!(got, vec![at(20), at(30)]);

        let got = newer_than(vec![at(3), at(1), at(2)], LastSynced::Never);
        assert_eq!(got, vec![at(1), at(2), at(3)]);
    }

    #[test]
    fn newer_than_drops_fractional_seconds() {
        let frac = at(10) + chrono::TimeDelta::milliseconds(126);

        assert!(newer_than(vec![frac], LastSynced::At(at(10))).is_empty());
        assert_eq!(newer_than(vec![frac], LastSynced::At(at(9))), vec![at(10)]);
        assert_eq!(newer_than(vec![frac, at(10)], LastSynced::Never), vec![at(10), at(10)]);
    }

    #[test]
    fn newer_than_is_idempotent() {
        let raw = vec![at(7), at(1), at(4)];
        let cursor = LastSynced::At(at(2));
        assert_eq!(newer_than(raw.clone(), cursor), newer_than(raw, cursor));
    }
}
