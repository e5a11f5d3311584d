use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::cursor::LastSynced;

const PAGE_SIZE: usize = 500;

/// Prefix Gerrit puts in front of every JSON body.
const XSSI_PREFIX: &str = ")]}'";

#[derive(Debug, Deserialize)]
struct Change {
    /// `YYYY-MM-DD hh:mm:ss.fffffffff`, always UTC.
    created: String,
    #[serde(default, rename = "_more_changes")]
    more_changes: bool,
}

/// List creation times of the changes owned by `username`.
///
/// Pages through `GET <base>/changes/` with `S` offsets while the last
/// change of a page carries `_more_changes`.
pub(super) fn fetch(
    client: &Client,
    base: &str,
    username: &str,
    later_than: LastSynced,
) -> Result<Vec<DateTime<Utc>>> {
    let url = format!("{base}/changes/");
    let mut q = format!("owner:{username}");
    if let Some(after) = later_than.as_datetime() {
        // without an offset Gerrit reads the time in the server's zone
        q.push_str(&format!(" after:\"{}\"", after.format("%Y-%m-%d %H:%M:%S +0000")));
    }

    let page_size = PAGE_SIZE.to_string();
    let mut out = Vec::new();
    loop {
        let start = out.len().to_string();
        debug!(%url, query = %q, start = %start, "requesting gerrit changes");
        let body = client
            .get(&url)
            .query(&[("q", q.as_str()), ("n", page_size.as_str()), ("S", start.as_str())])
            .send()?
            .error_for_status()?
            .text()?;

        let changes = parse_changes(&body).with_context(|| format!("invalid response from {url}"))?;
        let more = changes.last().is_some_and(|c| c.more_changes);
        for c in changes {
            out.push(parse_timestamp(&c.created)?);
        }
        if !more {
            break;
        }
    }
    Ok(out)
}

fn parse_changes(body: &str) -> Result<Vec<Change>> {
    let json = body.trim_start().trim_start_matches(XSSI_PREFIX);
    Ok(serde_json::from_str(json)?)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .with_context(|| format!("invalid gerrit timestamp: {raw}"))?;
    Ok(naive.and_utc())
}
