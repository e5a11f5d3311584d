use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use tracing::debug;

use super::calendar::expand_day_counts;

/// Fetch the public contribution calendar of `username`.
///
/// `GET <base>/users/<username>/calendar.json` answers with a map of
/// `YYYY-MM-DD` to the number of contributions on that day.
pub(super) fn fetch(client: &Client, base: &str, username: &str) -> Result<Vec<DateTime<Utc>>> {
    let url = calendar_url(base, username)?;
    debug!(%url, "requesting gitlab calendar");
    let days: BTreeMap<String, u32> = client
        .get(url.clone())
        .send()?
        .error_for_status()?
        .json()
        .with_context(|| format!("invalid calendar from {url}"))?;

    let parsed = days
        .into_iter()
        .map(|(day, count)| {
            NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map(|d| (d, count))
                .with_context(|| format!("invalid calendar day: {day}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(expand_day_counts(parsed))
}

/// `<base>/users/<username>/calendar.json` with the username percent-encoded
/// as a single path segment.
fn calendar_url(base: &str, username: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid instance URL: {base}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("instance URL cannot have a path: {base}"))?
        .pop_if_empty()
        .extend(["users", username, "calendar.json"]);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn expands_calendar_days() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/users/alice/calendar.json");
            then.status(200)
                .json_body(json!({ "2024-01-02": 2, "2024-01-01": 1 }));
        });

        let client = Client::new();
        let got = fetch(&client, &server.base_url(), "alice").unwrap();

        m.assert();
        let secs: Vec<i64> = got.iter().map(|t| t.timestamp()).collect();
        assert_eq!(secs, vec![1_704_067_200, 1_704_153_600, 1_704_153_601]);
    }

    #[test]
    fn calendar_url_encodes_username() {
        let url = calendar_url("https://git.example.org/gitlab", "a b/c").unwrap();
        assert_eq!(url.as_str(), "https://git.example.org/gitlab/users/a%20b%2Fc/calendar.json");

        let url = calendar_url("https://gitlab.com", "alice").unwrap();
        assert_eq!(url.as_str(), "https://gitlab.com/users/alice/calendar.json");

        assert!(calendar_url("mailto:x@example.org", "alice").is_err());
    }

    #[test]
    fn http_errors_propagate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/ghost/calendar.json");
            then.status(404);
        });

        let client = Client::new();
        assert!(fetch(&client, &server.base_url(), "ghost").is_err());
    }

    #[test]
    fn rejects_malformed_days() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/alice/calendar.json");
            then.status(200).json_body(json!({ "yesterday": 1 }));
        });

        let client = Client::new();
        let err = fetch(&client, &server.base_url(), "alice").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }
}
