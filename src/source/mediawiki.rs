use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::cursor::LastSynced;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    query: Option<Query>,
    /// Continuation parameters to send with the next request.
    #[serde(default, rename = "continue")]
    cont: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct Query {
    #[serde(default)]
    usercontribs: Vec<Contribution>,
}

#[derive(Debug, Deserialize)]
struct Contribution {
    timestamp: DateTime<Utc>,
}

/// List the edit timestamps of `username` through the MediaWiki action API.
///
/// `base` is the URL of the wiki's `api.php`. Contributions are requested
/// oldest-first starting at the cursor and every continuation page is
/// followed.
pub(super) fn fetch(
    client: &Client,
    base: &str,
    username: &str,
    later_than: LastSynced,
) -> Result<Vec<DateTime<Utc>>> {
    let mut params: Vec<(String, String)> = [
        ("action", "query"),
        ("list", "usercontribs"),
        ("ucuser", username),
        ("ucprop", "timestamp"),
        ("ucdir", "newer"),
        ("uclimit", "max"),
        ("format", "json"),
        ("formatversion", "2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    if let Some(start) = later_than.as_datetime() {
        params.push((
            "ucstart".to_string(),
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }

    let mut out = Vec::new();
    let mut cont: BTreeMap<String, String> = BTreeMap::new();
    loop {
        let query = page_query(&params, &cont);
        debug!(url = base, pages_continued = !cont.is_empty(), "requesting usercontribs");

        let resp: Response = client
            .get(base)
            .query(&query)
            .send()?
            .error_for_status()?
            .json()
            .with_context(|| format!("invalid usercontribs response from {base}"))?;

        if let Some(q) = resp.query {
            out.extend(q.usercontribs.into_iter().map(|c| c.timestamp));
        }
        match resp.cont {
            Some(next) if !next.is_empty() => cont = next,
            _ => break,
        }
    }
    Ok(out)
}

/// Base parameters plus whatever the previous page asked to continue with.
fn page_query(
    params: &[(String, String)],
    cont: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut query = params.to_vec();
    query.extend(cont.iter().map(|(k, v)| (k.clone(), v.clone())));
    query
}
