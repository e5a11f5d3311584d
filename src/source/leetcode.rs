use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

use super::calendar::expand_day_counts;

const CALENDAR_QUERY: &str = "query userProfileCalendar($username: String!) { \
    matchedUser(username: $username) { userCalendar { submissionCalendar } } }";

#[derive(Debug, Deserialize)]
struct Response {
    data: Data,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    user_calendar: UserCalendar,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserCalendar {
    /// JSON object encoded as a string: day-start unix seconds to count.
    submission_calendar: String,
}

/// Fetch the submission calendar of `username` via the GraphQL endpoint.
pub(super) fn fetch(client: &Client, base: &str, username: &str) -> Result<Vec<DateTime<Utc>>> {
    let url = format!("{base}/graphql");
    debug!(%url, "requesting leetcode calendar");
    let body = json!({
        "operationName": "userProfileCalendar",
        "query": CALENDAR_QUERY,
        "variables": { "username": username },
    });
    let resp: Response = client
        .post(&url)
        .json(&body)
        .send()?
        .error_for_status()?
        .json()
        .with_context(|| format!("invalid response from {url}"))?;

    let user = resp
        .data
        .matched_user
        .ok_or_else(|| anyhow!("leetcode user not found: {username}"))?;
    parse_submission_calendar(&user.user_calendar.submission_calendar)
}

fn parse_submission_calendar(raw: &str) -> Result<Vec<DateTime<Utc>>> {
    let days: BTreeMap<String, u32> =
        serde_json::from_str(raw).context("invalid submissionCalendar")?;
    let parsed = days
        .into_iter()
        .map(|(secs, count)| {
            secs.parse::<i64>()
                .ok()
                .and_then(|s| DateTime::from_timestamp(s, 0))
                .map(|t| (t.date_naive(), count))
                .ok_or_else(|| anyhow!("invalid calendar day: {secs}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(expand_day_counts(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn parses_embedded_calendar() {
        let got = parse_submission_calendar(r#"{"1704067200": 2, "1704153600": 1}"#).unwrap();
        let secs: Vec<i64> = got.iter().map(|t| t.timestamp()).collect();
        assert_eq!(secs, vec![1_704_067_200, 1_704_067_201, 1_704_153_600]);
    }

    #[test]
    fn posts_graphql_query() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql")
                .body_contains("userProfileCalendar")
                .body_contains("\"username\":\"alice\"");
            then.status(200).json_body(json!({
                "data": { "matchedUser": { "userCalendar": {
                    "submissionCalendar": "{\"1704067200\": 1}"
                } } }
            }));
        });

        let client = Client::new();
        let got = fetch(&client, &server.base_url(), "alice").unwrap();

        m.assert();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].timestamp(), 1_704_067_200);
    }

    #[test]
    fn unknown_user_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200)
                .json_body(json!({ "data": { "matchedUser": null } }));
        });

        let client = Client::new();
        let err = fetch(&client, &server.base_url(), "ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
